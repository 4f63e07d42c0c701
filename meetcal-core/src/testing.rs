//! In-memory calendar used by the sync and executor tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::calendar_event::{CalendarEvent, RemoteEvent};
use crate::diff::DiffKind;
use crate::error::CalendarError;
use crate::remote::CalendarClient;

#[derive(Default)]
pub struct FakeCalendar {
    events: Mutex<BTreeMap<String, RemoteEvent>>,
    calls: Mutex<Vec<(DiffKind, String)>>,
    fail_on: Option<String>,
}

impl FakeCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: impl IntoIterator<Item = RemoteEvent>) -> Self {
        FakeCalendar {
            events: Mutex::new(events.into_iter().map(|e| (e.id.clone(), e)).collect()),
            ..Default::default()
        }
    }

    /// Make every mutation of `event_id` fail.
    pub fn failing_on(mut self, event_id: &str) -> Self {
        self.fail_on = Some(event_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(DiffKind, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn event_ids(&self) -> Vec<String> {
        self.events.lock().unwrap().keys().cloned().collect()
    }

    pub fn event(&self, id: &str) -> Option<RemoteEvent> {
        self.events.lock().unwrap().get(id).cloned()
    }

    fn record(&self, kind: DiffKind, id: &str) -> Result<(), CalendarError> {
        self.calls.lock().unwrap().push((kind, id.to_string()));
        if self.fail_on.as_deref() == Some(id) {
            return Err(CalendarError(format!("rejected {}", id)));
        }
        Ok(())
    }
}

impl CalendarClient for FakeCalendar {
    async fn list_events(&self) -> Result<Vec<RemoteEvent>, CalendarError> {
        Ok(self.events.lock().unwrap().values().cloned().collect())
    }

    async fn create_event(&self, event: &CalendarEvent) -> Result<(), CalendarError> {
        self.record(DiffKind::Create, &event.id)?;
        self.events
            .lock()
            .unwrap()
            .insert(event.id.clone(), RemoteEvent::from(event.clone()));
        Ok(())
    }

    async fn update_event(&self, event: &CalendarEvent) -> Result<(), CalendarError> {
        self.record(DiffKind::Update, &event.id)?;
        self.events
            .lock()
            .unwrap()
            .insert(event.id.clone(), RemoteEvent::from(event.clone()));
        Ok(())
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        self.record(DiffKind::Delete, event_id)?;
        self.events.lock().unwrap().remove(event_id);
        Ok(())
    }
}
