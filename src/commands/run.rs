use anyhow::Result;
use owo_colors::OwoColorize;

use meetcal_core::IdentityWrite;

use crate::commands::SyncContext;
use crate::render::{self, Render};

pub async fn run(ctx: &SyncContext) -> Result<()> {
    let spinner = render::create_spinner(format!("Fetching {}", ctx.settings.feed_url));
    let feed = ctx.fetch_feed().await;
    spinner.finish_and_clear();
    let feed = feed?;

    let sync = ctx.sync();

    let spinner = render::create_spinner("Reconciling meetings".to_string());
    let plan = sync.prepare(&feed, IdentityWrite::Commit).await;
    spinner.finish_and_clear();
    let plan = plan?;

    println!("{}", render::render_stages(&plan));
    println!("{}", "Calendar changes:".dimmed());
    println!("{}", render::render_plan(&plan.apply));

    let summary = sync.apply(&plan).await?;

    println!("{}", summary.render());
    println!("ok");

    Ok(())
}
