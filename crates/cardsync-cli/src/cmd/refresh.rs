use super::Ctx;
use crate::output::print_json;
use anyhow::Context;

/// `cardsync refresh-all`: re-fetch every stored record.
///
/// Individual failures are already logged as warnings on stderr and leave
/// the old file in place; the command still succeeds. Only a directory that
/// cannot be created or listed makes it fail.
pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let runner = ctx.runner()?;
    let report = runner.refresh_all().context("refresh aborted")?;

    if ctx.json {
        print_json(&report)?;
    } else {
        println!("{}", report.summary());
    }
    Ok(())
}
