//! meetcal configuration.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::feed::FeedOptions;

pub const DEFAULT_FEED_URL: &str = "http://somervillecityma.iqm2.com/Services/RSS.aspx?Feed=Calendar";
pub const DEFAULT_EVENT_ID_PREFIX: &str = "somerville";
pub const DEFAULT_TIME_ZONE: &str = "America/New_York";
pub const DEFAULT_GOOGLE_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

const ENV_PREFIX: &str = "MEETCAL";

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_event_id_prefix() -> String {
    DEFAULT_EVENT_ID_PREFIX.to_string()
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_google_api_base() -> String {
    DEFAULT_GOOGLE_API_BASE.to_string()
}

fn default_true() -> bool {
    true
}

/// Configuration as read from ~/.config/meetcal/config.toml and the
/// `MEETCAL_*` environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetcalConfig {
    #[serde(default)]
    pub calendar_id: String,

    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    #[serde(default = "default_event_id_prefix")]
    pub event_id_prefix: String,

    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Where the identity store lives. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub persist_identity: bool,

    #[serde(default)]
    pub skip_malformed_entries: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_access_token: Option<String>,

    #[serde(default = "default_google_api_base")]
    pub google_api_base: String,
}

impl Default for MeetcalConfig {
    fn default() -> Self {
        MeetcalConfig {
            calendar_id: String::new(),
            feed_url: default_feed_url(),
            event_id_prefix: default_event_id_prefix(),
            time_zone: default_time_zone(),
            data_dir: None,
            persist_identity: true,
            skip_malformed_entries: false,
            google_access_token: None,
            google_api_base: default_google_api_base(),
        }
    }
}

/// Validated settings for one sync.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub calendar_id: String,
    pub feed_url: String,
    pub event_id_prefix: String,
    pub time_zone: Tz,
    pub data_dir: PathBuf,
    pub persist_identity: bool,
    pub skip_malformed_entries: bool,
    pub google_access_token: Option<String>,
    pub google_api_base: String,
}

impl SyncSettings {
    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            time_zone: self.time_zone,
            skip_malformed_entries: self.skip_malformed_entries,
        }
    }
}

impl MeetcalConfig {
    pub fn config_path() -> SyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SyncError::Config("Could not determine config directory".into()))?
            .join("meetcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path` (or the default location), then the environment.
    ///
    /// A missing file is not an error; every key can come from the
    /// environment alone.
    pub fn load(path: Option<&Path>) -> SyncResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        Self::load_from(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(path: PathBuf, env: Environment) -> SyncResult<Self> {
        tracing::debug!(path = %path.display(), "loading config");

        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env)
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))
    }

    pub fn settings(&self) -> SyncResult<SyncSettings> {
        if self.calendar_id.trim().is_empty() {
            return Err(SyncError::Config(
                "calendar_id is required (set it in config.toml or MEETCAL_CALENDAR_ID)".into(),
            ));
        }

        let prefix_ok = self
            .event_id_prefix
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'v').contains(&b));
        if !prefix_ok {
            return Err(SyncError::Config(format!(
                "event_id_prefix '{}' may only contain the characters 0-9 and a-v",
                self.event_id_prefix
            )));
        }

        let time_zone: Tz = self
            .time_zone
            .parse()
            .map_err(|_| SyncError::Config(format!("Unknown time zone '{}'", self.time_zone)))?;

        url::Url::parse(&self.feed_url)
            .map_err(|e| SyncError::Config(format!("Invalid feed_url '{}': {}", self.feed_url, e)))?;

        Ok(SyncSettings {
            calendar_id: self.calendar_id.trim().to_string(),
            feed_url: self.feed_url.clone(),
            event_id_prefix: self.event_id_prefix.clone(),
            time_zone,
            data_dir: self.data_path()?,
            persist_identity: self.persist_identity,
            skip_malformed_entries: self.skip_malformed_entries,
            google_access_token: self.google_access_token.clone(),
            google_api_base: self.google_api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn data_path(&self) -> SyncResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => {
                let expanded = shellexpand::tilde(&dir.to_string_lossy()).into_owned();
                Ok(PathBuf::from(expanded))
            }
            None => dirs::data_dir()
                .map(|dir| dir.join("meetcal"))
                .ok_or_else(|| SyncError::Config("Could not determine data directory".into())),
        }
    }
}
