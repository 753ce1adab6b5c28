use super::Ctx;
use crate::output::{format_bytes, print_json, print_table};
use anyhow::Context;

pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let store = ctx.store(&config);
    if !store.dir().exists() {
        if ctx.json {
            print_json(&Vec::<()>::new())?;
        } else {
            println!("No records: {} does not exist.", store.dir().display());
        }
        return Ok(());
    }

    let entries = store.entries().context("failed to list records")?;

    if ctx.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No records in {}.", store.dir().display());
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.key.to_string(),
                format_bytes(e.bytes),
                e.modified
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["KEY", "SIZE", "MODIFIED"], &rows, &[1]);
    Ok(())
}
