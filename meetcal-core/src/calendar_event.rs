//! Calendar representation of meetings.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, FixedOffset};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::identity::PersistedMeeting;

/// The feed has no end times, so every meeting is booked for an hour.
pub const EVENT_DURATION: Duration = Duration::hours(1);

/// An event time as the calendar API represents it.
///
/// Two values are equal when they denote the same instant in the same named
/// zone, whatever offset the `dateTime` string was written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl fmt::Display for EventDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date_time.to_rfc3339())?;
        if let Some(tz) = &self.time_zone {
            write!(f, " ({})", tz)?;
        }
        Ok(())
    }
}

/// The event a meeting should be mirrored as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

impl CalendarEvent {
    pub fn from_meeting(record: &PersistedMeeting, prefix: &str, tz: Tz) -> Self {
        let meeting = &record.meeting;
        let start = meeting.date.with_timezone(&tz).fixed_offset();

        CalendarEvent {
            id: event_id(prefix, &record.record_id),
            summary: meeting.name.clone(),
            description: format!("Meeting Link: {}", meeting.link),
            start: EventDateTime {
                date_time: start,
                time_zone: Some(tz.name().to_string()),
            },
            end: EventDateTime {
                date_time: start + EVENT_DURATION,
                time_zone: Some(tz.name().to_string()),
            },
        }
    }
}

/// Calendar event id for a record. Stable for as long as the record exists.
pub fn event_id(prefix: &str, record_id: &str) -> String {
    format!("{}{}", prefix, record_id)
}

/// Build the desired calendar state, keyed by event id.
pub fn to_calendar_events(
    meetings: &BTreeMap<String, PersistedMeeting>,
    prefix: &str,
    tz: Tz,
) -> BTreeMap<String, CalendarEvent> {
    meetings
        .values()
        .map(|record| {
            let event = CalendarEvent::from_meeting(record, prefix, tz);
            (event.id.clone(), event)
        })
        .collect()
}

/// An event as currently stored in the remote calendar.
///
/// Any field may be missing on the remote side; a missing field never
/// equals a computed one.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
}

impl From<CalendarEvent> for RemoteEvent {
    fn from(event: CalendarEvent) -> Self {
        RemoteEvent {
            id: event.id,
            summary: Some(event.summary),
            description: Some(event.description),
            start: Some(event.start),
            end: Some(event.end),
        }
    }
}

impl fmt::Display for RemoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.summary {
            Some(summary) if !summary.is_empty() => write!(f, "{}", summary),
            _ => write!(f, "(No title)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::aggregate;
    use crate::meeting::tests::update;
    use chrono::{TimeZone, Utc};
    use chrono_tz::America::New_York;

    fn record(record_id: &str) -> PersistedMeeting {
        let meeting = aggregate(vec![update("s1", "100", "Board - Regular - June 5 2024")])
            .remove("100")
            .unwrap();
        PersistedMeeting::new(record_id, meeting)
    }

    #[test]
    fn test_event_from_meeting() {
        let event = CalendarEvent::from_meeting(&record("abc123"), "somerville", New_York);

        assert_eq!(event.id, "somervilleabc123");
        assert_eq!(event.summary, "Board");
        assert_eq!(
            event.description,
            "Meeting Link: https://example.gov/Detail_Meeting.aspx?ID=100"
        );
        assert_eq!(event.start.date_time.to_rfc3339(), "2024-06-05T19:00:00-04:00");
        assert_eq!(event.end.date_time.to_rfc3339(), "2024-06-05T20:00:00-04:00");
        assert_eq!(event.start.time_zone.as_deref(), Some("America/New_York"));
    }

    #[test]
    fn test_event_time_equality_ignores_offset_notation() {
        let local = EventDateTime {
            date_time: DateTime::parse_from_rfc3339("2024-06-05T19:00:00-04:00").unwrap(),
            time_zone: Some("America/New_York".to_string()),
        };
        let utc = EventDateTime {
            date_time: Utc.with_ymd_and_hms(2024, 6, 5, 23, 0, 0).unwrap().fixed_offset(),
            time_zone: Some("America/New_York".to_string()),
        };

        assert_eq!(local, utc);
    }

    #[test]
    fn test_event_serializes_in_calendar_api_shape() {
        let event = CalendarEvent::from_meeting(&record("abc123"), "somerville", New_York);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["id"], "somervilleabc123");
        assert_eq!(json["start"]["dateTime"], "2024-06-05T19:00:00-04:00");
        assert_eq!(json["start"]["timeZone"], "America/New_York");
        assert_eq!(json["end"]["dateTime"], "2024-06-05T20:00:00-04:00");
    }

    #[test]
    fn test_to_calendar_events_keys_by_event_id() {
        let mut meetings = BTreeMap::new();
        meetings.insert("100".to_string(), record("r1"));

        let events = to_calendar_events(&meetings, "somerville", New_York);
        assert_eq!(events.keys().collect::<Vec<_>>(), vec!["somerviller1"]);
    }
}
