//! Google Calendar v3 client.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use meetcal_core::{CalendarClient, CalendarError, CalendarEvent, EventDateTime, RemoteEvent, SyncSettings};

/// Events per list request (the API maximum).
const PAGE_SIZE: &str = "2500";

/// A single Google calendar, addressed by id and accessed with a bearer token.
pub struct GoogleCalendar {
    http: reqwest::Client,
    events_url: Url,
    access_token: String,
}

// Wire types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventList {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<GoogleDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<GoogleDateTime>,
}

/// All-day events carry `date` instead of `dateTime`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl GoogleDateTime {
    fn into_event_time(self) -> Option<EventDateTime> {
        let time_zone = self.time_zone;
        self.date_time.map(|date_time| EventDateTime {
            date_time,
            time_zone,
        })
    }
}

impl From<&EventDateTime> for GoogleDateTime {
    fn from(value: &EventDateTime) -> Self {
        GoogleDateTime {
            date_time: Some(value.date_time),
            time_zone: value.time_zone.clone(),
        }
    }
}

impl From<GoogleEvent> for RemoteEvent {
    fn from(event: GoogleEvent) -> Self {
        RemoteEvent {
            id: event.id,
            summary: event.summary,
            description: event.description,
            start: event.start.and_then(GoogleDateTime::into_event_time),
            end: event.end.and_then(GoogleDateTime::into_event_time),
        }
    }
}

impl From<&CalendarEvent> for GoogleEvent {
    fn from(event: &CalendarEvent) -> Self {
        GoogleEvent {
            id: event.id.clone(),
            summary: Some(event.summary.clone()),
            description: Some(event.description.clone()),
            start: Some((&event.start).into()),
            end: Some((&event.end).into()),
        }
    }
}

impl GoogleCalendar {
    pub fn new(settings: &SyncSettings, http: reqwest::Client) -> Result<Self> {
        let access_token = settings.google_access_token.clone().context(
            "No Google access token configured.\n\
             Set google_access_token in config.toml or MEETCAL_GOOGLE_ACCESS_TOKEN",
        )?;

        Ok(GoogleCalendar {
            http,
            events_url: events_url(&settings.google_api_base, &settings.calendar_id)?,
            access_token,
        })
    }

    fn event_url(&self, event_id: &str) -> Url {
        let mut url = self.events_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(event_id);
        }
        url
    }

    async fn list_page(&self, page_token: Option<&str>) -> Result<EventList, CalendarError> {
        let mut request = self
            .http
            .get(self.events_url.clone())
            .bearer_auth(&self.access_token)
            .query(&[("maxResults", PAGE_SIZE)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(request_error)?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| CalendarError(format!("Failed to parse event list: {}", e)))
    }
}

/// `{base}/calendars/{calendar_id}/events`, with the calendar id escaped.
fn events_url(base: &str, calendar_id: &str) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("Invalid Google API base '{}'", base))?;

    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Google API base '{}' cannot have a path", base))?
        .pop_if_empty()
        .push("calendars")
        .push(calendar_id)
        .push("events");

    Ok(url)
}

fn request_error(err: reqwest::Error) -> CalendarError {
    CalendarError(format!("Request to Google Calendar failed: {}", err))
}

/// Turn a non-success response into a `CalendarError`, keeping Google's message.
async fn check_status(response: Response) -> Result<Response, CalendarError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);

    Err(CalendarError(format!("Google Calendar returned {}: {}", status, message)))
}

impl CalendarClient for GoogleCalendar {
    async fn list_events(&self) -> Result<Vec<RemoteEvent>, CalendarError> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(page_token.as_deref()).await?;
            events.extend(page.items.into_iter().map(RemoteEvent::from));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = events.len(), "listed Google Calendar events");
        Ok(events)
    }

    async fn create_event(&self, event: &CalendarEvent) -> Result<(), CalendarError> {
        let response = self
            .http
            .post(self.events_url.clone())
            .bearer_auth(&self.access_token)
            .json(&GoogleEvent::from(event))
            .send()
            .await
            .map_err(request_error)?;

        check_status(response).await.map(|_| ())
    }

    async fn update_event(&self, event: &CalendarEvent) -> Result<(), CalendarError> {
        let response = self
            .http
            .patch(self.event_url(&event.id))
            .bearer_auth(&self.access_token)
            .json(&GoogleEvent::from(event))
            .send()
            .await
            .map_err(request_error)?;

        check_status(response).await.map(|_| ())
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        let response = self
            .http
            .delete(self.event_url(event_id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(request_error)?;

        // Already gone counts as deleted
        if response.status() == StatusCode::GONE {
            return Ok(());
        }

        check_status(response).await.map(|_| ())
    }
}
