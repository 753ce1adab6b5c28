use super::Ctx;
use crate::output::print_json;
use anyhow::Context;
use cardsync_core::RecordKey;

/// `cardsync add <key>`: fetch one record. Any failure is fatal.
pub fn run(ctx: &Ctx, key: &str) -> anyhow::Result<()> {
    let key = RecordKey::parse_input(key)?;
    let runner = ctx.runner()?;

    let path = runner
        .add(&key)
        .with_context(|| format!("failed to add record '{key}'"))?;

    if ctx.json {
        print_json(&serde_json::json!({
            "key": key,
            "path": path,
        }))?;
    } else {
        println!("Saved '{key}' to {}", path.display());
    }
    Ok(())
}
