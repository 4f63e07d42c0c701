//! Core library for meetcal.
//!
//! Turns a public meeting RSS feed into a durable set of meetings and
//! mirrors them into a calendar:
//!
//! - [`feed`] parses feed entries into [`meeting::MeetingUpdate`]s
//! - [`meeting`] aggregates updates per meeting id
//! - [`identity`] assigns each meeting a stable record id
//! - [`diff`] compares desired calendar events with the remote calendar
//! - [`executor`] applies the resulting plan
//! - [`sync`] runs all of the above in order

pub mod calendar_event;
pub mod config;
pub mod diff;
pub mod error;
pub mod executor;
pub mod feed;
pub mod identity;
pub mod meeting;
pub mod remote;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use calendar_event::{CalendarEvent, EventDateTime, RemoteEvent};
pub use config::{MeetcalConfig, SyncSettings};
pub use diff::{ApplyPlan, DiffKind, EventDiff};
pub use error::{ApplyError, CalendarError, ParseError, StoreError, SyncError, SyncResult};
pub use executor::ApplySummary;
pub use identity::{Identity, JsonFileStore, MeetingStore, MemoryStore, PersistedMeeting};
pub use meeting::{Meeting, MeetingUpdate};
pub use remote::CalendarClient;
pub use sync::{IdentityWrite, MeetingSync, SyncPlan};
