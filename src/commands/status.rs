use anyhow::Result;
use owo_colors::OwoColorize;

use meetcal_core::IdentityWrite;

use crate::commands::SyncContext;
use crate::render;

/// Show what `run` would do without writing to the store or the calendar.
pub async fn run(ctx: &SyncContext) -> Result<()> {
    let spinner = render::create_spinner(format!("Fetching {}", ctx.settings.feed_url));
    let feed = ctx.fetch_feed().await;
    spinner.finish_and_clear();
    let feed = feed?;

    let spinner = render::create_spinner("Computing changes".to_string());
    let plan = ctx.sync().prepare(&feed, IdentityWrite::Preview).await;
    spinner.finish_and_clear();
    let plan = plan?;

    println!("{}", render::render_stages(&plan));
    println!("{}", "Calendar changes:".dimmed());
    println!("{}", render::render_plan(&plan.apply));

    if plan.apply.is_empty() {
        println!("\nEverything up to date.");
    } else {
        let (created, updated, deleted) = plan.apply.counts();
        println!(
            "\n{} to add, {} to update, {} to delete. Run `meetcal run` to apply.",
            created, updated, deleted
        );
    }

    Ok(())
}
