//! Remote calendar collaborator.

use crate::calendar_event::{CalendarEvent, RemoteEvent};
use crate::error::CalendarError;

/// Operations the sync needs from a remote calendar.
///
/// Implementations own their connection details (calendar id, credentials)
/// and are constructed once per run.
#[allow(async_fn_in_trait)]
pub trait CalendarClient {
    /// Every event in the calendar, across all result pages.
    async fn list_events(&self) -> Result<Vec<RemoteEvent>, CalendarError>;

    /// Insert an event under its own id.
    async fn create_event(&self, event: &CalendarEvent) -> Result<(), CalendarError>;

    /// Overwrite the fields of an existing event.
    async fn update_event(&self, event: &CalendarEvent) -> Result<(), CalendarError>;

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError>;
}
