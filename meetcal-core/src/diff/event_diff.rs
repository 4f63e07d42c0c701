use std::fmt;

use serde::Serialize;

use crate::calendar_event::{CalendarEvent, EventDateTime, RemoteEvent};
use crate::diff::DiffKind;

/// One field whose remote value differs from the computed one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: Option<String>,
    pub new: String,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let old = self.old.as_deref().unwrap_or("(none)");
        write!(f, "{}: {} -> {}", self.field, old, self.new)
    }
}

fn compare<T: PartialEq + ToString>(
    field: &'static str,
    old: Option<&T>,
    new: &T,
    changes: &mut Vec<FieldChange>,
) {
    if old != Some(new) {
        changes.push(FieldChange {
            field,
            old: old.map(T::to_string),
            new: new.to_string(),
        });
    }
}

/// Fields of `new` that differ from `old`, in field-name order.
pub fn changed_fields(old: &RemoteEvent, new: &CalendarEvent) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    compare("description", old.description.as_ref(), &new.description, &mut changes);
    compare::<EventDateTime>("end", old.end.as_ref(), &new.end, &mut changes);
    compare::<EventDateTime>("start", old.start.as_ref(), &new.start, &mut changes);
    compare("summary", old.summary.as_ref(), &new.summary, &mut changes);

    changes
}

/// A single entry of an apply plan.
#[derive(Debug, Clone)]
pub struct EventDiff {
    pub kind: DiffKind,
    /// Remote state before the change (absent for creates)
    pub old: Option<RemoteEvent>,
    /// Desired state (absent for deletes)
    pub new: Option<CalendarEvent>,
    /// Changed fields, filled for updates
    pub changes: Vec<FieldChange>,
}

impl fmt::Display for EventDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self
            .start()
            .map(|s| s.date_time.to_rfc3339())
            .unwrap_or_else(|| "?".to_string());
        write!(f, "{} {}: {} [{}]", self.kind, start, self.summary(), self.event_id())
    }
}

impl EventDiff {
    pub fn get_diff(old: Option<RemoteEvent>, new: Option<CalendarEvent>) -> Option<EventDiff> {
        match (&old, &new) {
            (None, Some(_)) => Some(EventDiff {
                kind: DiffKind::Create,
                old: None,
                new,
                changes: Vec::new(),
            }),
            (Some(_), None) => Some(EventDiff {
                kind: DiffKind::Delete,
                old,
                new: None,
                changes: Vec::new(),
            }),
            (Some(o), Some(n)) => {
                let changes = changed_fields(o, n);
                if changes.is_empty() {
                    None
                } else {
                    Some(EventDiff {
                        kind: DiffKind::Update,
                        old,
                        new,
                        changes,
                    })
                }
            }
            (None, None) => None,
        }
    }

    pub fn event_id(&self) -> &str {
        match (&self.new, &self.old) {
            (Some(new), _) => &new.id,
            (None, Some(old)) => &old.id,
            (None, None) => "",
        }
    }

    pub fn summary(&self) -> String {
        match (&self.new, &self.old) {
            (Some(new), _) => new.summary.clone(),
            (None, Some(old)) => old.to_string(),
            (None, None) => String::new(),
        }
    }

    pub fn start(&self) -> Option<&EventDateTime> {
        match (&self.new, &self.old) {
            (Some(new), _) => Some(&new.start),
            (None, Some(old)) => old.start.as_ref(),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn event() -> CalendarEvent {
        let start = DateTime::parse_from_rfc3339("2024-06-05T19:00:00-04:00").unwrap();
        CalendarEvent {
            id: "somerville100".to_string(),
            summary: "Board".to_string(),
            description: "Meeting Link: https://example.gov/?ID=100".to_string(),
            start: EventDateTime {
                date_time: start,
                time_zone: Some("America/New_York".to_string()),
            },
            end: EventDateTime {
                date_time: start + chrono::Duration::hours(1),
                time_zone: Some("America/New_York".to_string()),
            },
        }
    }

    #[test]
    fn test_identical_events_have_no_diff() {
        let remote = RemoteEvent::from(event());
        assert!(EventDiff::get_diff(Some(remote), Some(event())).is_none());
    }

    #[test]
    fn test_each_changed_field_makes_an_update() {
        let mutations: Vec<(&str, Box<dyn Fn(&mut RemoteEvent)>)> = vec![
            ("description", Box::new(|r: &mut RemoteEvent| r.description = Some("old".to_string()))),
            ("end", Box::new(|r: &mut RemoteEvent| {
                if let Some(end) = r.end.as_mut() {
                    end.date_time = end.date_time + chrono::Duration::minutes(30);
                }
            })),
            ("start", Box::new(|r: &mut RemoteEvent| {
                if let Some(start) = r.start.as_mut() {
                    start.time_zone = None;
                }
            })),
            ("summary", Box::new(|r: &mut RemoteEvent| r.summary = Some("Old Board".to_string()))),
        ];

        for (field, mutate) in mutations {
            let mut remote = RemoteEvent::from(event());
            mutate(&mut remote);

            let diff = EventDiff::get_diff(Some(remote), Some(event())).unwrap();
            assert_eq!(diff.kind, DiffKind::Update);
            assert_eq!(diff.changes.len(), 1, "field {}", field);
            assert_eq!(diff.changes[0].field, field);
        }
    }

    #[test]
    fn test_missing_remote_field_differs() {
        let mut remote = RemoteEvent::from(event());
        remote.description = None;

        let diff = EventDiff::get_diff(Some(remote), Some(event())).unwrap();
        assert_eq!(
            diff.changes,
            vec![FieldChange {
                field: "description",
                old: None,
                new: "Meeting Link: https://example.gov/?ID=100".to_string(),
            }]
        );
    }

    #[test]
    fn test_changes_are_in_field_name_order() {
        let remote = RemoteEvent {
            id: "somerville100".to_string(),
            summary: None,
            description: None,
            start: None,
            end: None,
        };

        let diff = EventDiff::get_diff(Some(remote), Some(event())).unwrap();
        let fields: Vec<_> = diff.changes.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec!["description", "end", "start", "summary"]);
    }

    #[test]
    fn test_create_and_delete_kinds() {
        let create = EventDiff::get_diff(None, Some(event())).unwrap();
        assert_eq!(create.kind, DiffKind::Create);
        assert_eq!(create.event_id(), "somerville100");

        let delete = EventDiff::get_diff(Some(RemoteEvent::from(event())), None).unwrap();
        assert_eq!(delete.kind, DiffKind::Delete);
        assert_eq!(delete.event_id(), "somerville100");
        assert_eq!(delete.summary(), "Board");

        assert!(EventDiff::get_diff(None, None).is_none());
    }
}
