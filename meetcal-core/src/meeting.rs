//! Meeting records parsed from the feed, and their aggregation.
//!
//! The feed publishes one entry per agenda/minutes posting, so a single
//! meeting usually shows up several times. [`aggregate`] folds those entries
//! into one [`Meeting`] per `meeting_id`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingUpdate {
    /// Feed entry identifier (guid, or link when the entry has none)
    pub source_id: String,
    pub meeting_id: String,
    /// Meeting start, normalized to UTC
    pub date: DateTime<Utc>,
    pub link: String,
    pub name: String,
    pub meeting_type: String,
    pub published_at: DateTime<Utc>,
    pub summary: String,
    pub tags: Vec<String>,
    pub raw_title: String,
}

/// All updates for one meeting in a feed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub meeting_id: String,
    pub date: DateTime<Utc>,
    pub link: String,
    pub name: String,
    pub updates: Vec<MeetingUpdate>,
}

impl Meeting {
    fn seed(update: &MeetingUpdate) -> Self {
        Meeting {
            meeting_id: update.meeting_id.clone(),
            date: update.date,
            link: update.link.clone(),
            name: update.name.clone(),
            updates: Vec::new(),
        }
    }
}

/// Sort updates into the order aggregation expects.
///
/// Feed entry ids are not guaranteed to arrive in order. Ties on
/// `source_id` fall back to publication time and title so the order is total.
pub fn sort_updates(updates: &mut [MeetingUpdate]) {
    updates.sort_by(|a, b| {
        a.source_id
            .cmp(&b.source_id)
            .then_with(|| a.published_at.cmp(&b.published_at))
            .then_with(|| a.raw_title.cmp(&b.raw_title))
    });
}

/// Group sorted updates by `meeting_id`.
///
/// The first update seen for an id seeds the meeting's date, link and name;
/// every update is appended in arrival order.
pub fn aggregate(updates: Vec<MeetingUpdate>) -> BTreeMap<String, Meeting> {
    let mut meetings: BTreeMap<String, Meeting> = BTreeMap::new();

    for update in updates {
        meetings
            .entry(update.meeting_id.clone())
            .or_insert_with(|| Meeting::seed(&update))
            .updates
            .push(update);
    }

    meetings
}
