//! TUI rendering for meetcal-core types.
//!
//! Extension traits that add colored terminal output to plans and diffs
//! using owo_colors.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use meetcal_core::diff::FieldChange;
use meetcal_core::{ApplyPlan, ApplySummary, DiffKind, EventDiff, SyncPlan};

pub trait Render {
    fn render(&self) -> String;
}

impl Render for DiffKind {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            DiffKind::Create => symbol.green().to_string(),
            DiffKind::Update => symbol.yellow().to_string(),
            DiffKind::Delete => symbol.red().to_string(),
        }
    }
}

fn colorize_diff(kind: DiffKind, text: &str) -> String {
    match kind {
        DiffKind::Create => text.green().to_string(),
        DiffKind::Update => text.yellow().to_string(),
        DiffKind::Delete => text.red().to_string(),
    }
}

impl Render for EventDiff {
    fn render(&self) -> String {
        let start = self
            .start()
            .map(|s| s.date_time.to_rfc3339())
            .unwrap_or_else(|| "?".to_string());
        let summary = colorize_diff(self.kind, &self.summary());
        let id = format!("[{}]", self.event_id());

        format!("{} {}: {} {}", self.kind.render(), start, summary, id.dimmed())
    }
}

impl Render for FieldChange {
    fn render(&self) -> String {
        let old = self.old.as_deref().unwrap_or("(none)");
        format!("{}: {} -> {}", self.field, old.dimmed(), self.new)
    }
}

impl Render for ApplySummary {
    fn render(&self) -> String {
        format!(
            "Added: {}\nDeleted: {}\nUpdated: {}",
            self.created, self.deleted, self.updated
        )
    }
}

/// Stage counts for a prepared sync.
pub fn render_stages(plan: &SyncPlan) -> String {
    let mut lines = vec![format!("Feed entries: {}", plan.entry_count)];
    if !plan.skipped.is_empty() {
        lines.push(format!("Skipped entries: {}", plan.skipped.len()).yellow().to_string());
        for skipped in &plan.skipped {
            lines.push(format!("   {} {}", skipped.source_id, skipped.error.dimmed()));
        }
    }
    lines.push(format!("Meetings: {}", plan.meetings.len()));

    let identity = &plan.identity;
    lines.push(format!(
        "Identities: {} new, {} changed, {} unchanged, {} removed",
        identity.added.len(),
        identity.updated.len(),
        identity.unchanged.len(),
        identity.deleted.len()
    ));
    if !identity.duplicates.is_empty() {
        lines.push(
            format!("Duplicate identities removed: {}", identity.duplicates.len())
                .yellow()
                .to_string(),
        );
    }

    lines.join("\n")
}

/// One line per planned calendar change, in execution order.
pub fn render_plan(plan: &ApplyPlan) -> String {
    if plan.is_empty() {
        return "   No changes".dimmed().to_string();
    }

    let mut lines = Vec::new();
    for diff in plan.iter() {
        lines.push(format!("   {}", diff.render()));
        if diff.kind == DiffKind::Update {
            lines.extend(diff.changes.iter().map(|c| format!("      {}", c.render())));
        }
    }

    lines.join("\n")
}

pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/"])
            .template("{msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
