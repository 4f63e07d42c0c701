//! Durable meeting identity.
//!
//! Feed meeting ids are external; each meeting also gets a `record_id` that
//! never changes for as long as the meeting stays in the feed. Calendar
//! event ids are derived from the record id.

mod reconcile;
mod record_id;
mod store;

pub use reconcile::{ReconcilePlan, ReconcileReport, Reconciled, Reconciler, pass_through};
pub use record_id::{MAX_ID_ATTEMPTS, RECORD_ID_LEN, assign_record_id, random_record_id};
pub use store::{JsonFileStore, MeetingStore, MemoryStore};

use serde::{Deserialize, Serialize};

use crate::meeting::Meeting;

/// A meeting together with its durable record id.
///
/// Serialized flat, so a stored document has `record_id`, `meeting_id`,
/// `date`, `link`, `name` and `updates` at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedMeeting {
    pub record_id: String,
    #[serde(flatten)]
    pub meeting: Meeting,
}

impl PersistedMeeting {
    pub fn new(record_id: impl Into<String>, meeting: Meeting) -> Self {
        PersistedMeeting {
            record_id: record_id.into(),
            meeting,
        }
    }

    pub fn meeting_id(&self) -> &str {
        &self.meeting.meeting_id
    }
}

/// Where durable ids come from for a run.
#[derive(Clone, Copy)]
pub enum Identity<'a> {
    /// No store: `record_id` is the feed's `meeting_id`.
    Ephemeral,
    Persistent(&'a dyn MeetingStore),
}
