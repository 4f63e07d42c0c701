//! Desired-vs-remote calendar diffing.

use std::collections::BTreeMap;

use crate::calendar_event::{CalendarEvent, RemoteEvent};
use crate::diff::{DiffKind, EventDiff};

/// Mutations that bring the remote calendar to the desired state.
///
/// Each list is ordered by event id.
#[derive(Debug, Clone, Default)]
pub struct ApplyPlan {
    pub to_create: Vec<EventDiff>,
    pub to_delete: Vec<EventDiff>,
    pub to_update: Vec<EventDiff>,
}

impl ApplyPlan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty() && self.to_update.is_empty()
    }

    /// (created, updated, deleted)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.to_create.len(), self.to_update.len(), self.to_delete.len())
    }

    /// All entries in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &EventDiff> {
        self.to_create
            .iter()
            .chain(self.to_delete.iter())
            .chain(self.to_update.iter())
    }
}

/// Compare the desired events against what the calendar currently holds.
///
/// Remote events are matched purely by id. Remote events with no desired
/// counterpart are scheduled for deletion, whoever created them.
pub fn compute_plan(desired: &BTreeMap<String, CalendarEvent>, remote: &[RemoteEvent]) -> ApplyPlan {
    let remote_by_id: BTreeMap<&str, &RemoteEvent> =
        remote.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut plan = ApplyPlan::default();

    for (id, event) in desired {
        let old = remote_by_id.get(id.as_str()).map(|e| (*e).clone());
        if let Some(diff) = EventDiff::get_diff(old, Some(event.clone())) {
            match diff.kind {
                DiffKind::Create => plan.to_create.push(diff),
                DiffKind::Update => plan.to_update.push(diff),
                DiffKind::Delete => plan.to_delete.push(diff),
            }
        }
    }

    for (id, event) in &remote_by_id {
        if desired.contains_key(*id) {
            continue;
        }
        if let Some(diff) = EventDiff::get_diff(Some((*event).clone()), None) {
            plan.to_delete.push(diff);
        }
    }

    plan
}
