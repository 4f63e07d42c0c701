pub mod run;
pub mod serve;
pub mod status;

use std::path::Path;

use anyhow::{Context, Result};
use meetcal_core::{Identity, JsonFileStore, MeetcalConfig, MeetingSync, SyncSettings};

use crate::feed;
use crate::providers::GoogleCalendar;

/// Everything a sync needs, built once per process.
pub struct SyncContext {
    pub settings: SyncSettings,
    http: reqwest::Client,
    calendar: GoogleCalendar,
    store: Option<JsonFileStore>,
}

impl SyncContext {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let settings = MeetcalConfig::load(config_path)?.settings()?;

        let http = feed::http_client().context("Failed to build HTTP client")?;
        let calendar = GoogleCalendar::new(&settings, http.clone())?;

        let store = if settings.persist_identity {
            let store = JsonFileStore::open(&settings.data_dir).with_context(|| {
                format!("Could not open identity store in {}", settings.data_dir.display())
            })?;
            tracing::debug!(path = %store.path().display(), "using identity store");
            Some(store)
        } else {
            None
        };

        Ok(SyncContext {
            settings,
            http,
            calendar,
            store,
        })
    }

    pub fn sync(&self) -> MeetingSync<'_, GoogleCalendar> {
        let identity = match &self.store {
            Some(store) => Identity::Persistent(store),
            None => Identity::Ephemeral,
        };
        MeetingSync::new(&self.settings, identity, &self.calendar)
    }

    pub async fn fetch_feed(&self) -> Result<String> {
        Ok(feed::fetch(&self.http, &self.settings.feed_url).await?)
    }
}
