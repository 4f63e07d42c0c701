//! Apply a plan to a remote calendar.

use serde::Serialize;

use crate::diff::{ApplyPlan, DiffKind, EventDiff};
use crate::error::{ApplyError, CalendarError};
use crate::remote::CalendarClient;

/// Number of mutations performed, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub created: usize,
    pub deleted: usize,
    pub updated: usize,
}

impl ApplySummary {
    pub fn total(&self) -> usize {
        self.created + self.deleted + self.updated
    }
}

/// Run every create, then every delete, then every update.
///
/// Stops at the first failing call. Mutations already made are not rolled
/// back; the next run recomputes the plan from the calendar's actual state.
pub async fn execute<C: CalendarClient>(
    calendar: &C,
    plan: &ApplyPlan,
) -> Result<ApplySummary, ApplyError> {
    let mut summary = ApplySummary::default();

    for diff in plan.iter() {
        apply_one(calendar, diff).await?;
        match diff.kind {
            DiffKind::Create => summary.created += 1,
            DiffKind::Delete => summary.deleted += 1,
            DiffKind::Update => summary.updated += 1,
        }
    }

    Ok(summary)
}

async fn apply_one<C: CalendarClient>(calendar: &C, diff: &EventDiff) -> Result<(), ApplyError> {
    let event_id = diff.event_id().to_string();

    let result = match (diff.kind, &diff.new) {
        (DiffKind::Create, Some(event)) => calendar.create_event(event).await,
        (DiffKind::Update, Some(event)) => calendar.update_event(event).await,
        (DiffKind::Delete, _) => calendar.delete_event(&event_id).await,
        (_, None) => Err(CalendarError(format!("no desired event to {}", diff.kind.verb()))),
    };

    match result {
        Ok(()) => {
            tracing::info!(event_id = %event_id, summary = %diff.summary(), "{} event", diff.kind.verb());
            Ok(())
        }
        Err(source) => {
            tracing::error!(event_id = %event_id, error = %source, "failed to {} event", diff.kind.verb());
            Err(ApplyError {
                event_id,
                kind: diff.kind,
                source,
            })
        }
    }
}
