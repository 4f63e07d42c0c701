//! RSS feed parsing.
//!
//! Turns the raw calendar feed into [`MeetingUpdate`] records. Each entry
//! title follows `"Name - Type - DateString"` and each link carries the
//! meeting id as an `ID` query parameter.

mod date;

pub use date::{localize, parse_local_date, parse_published};

use chrono_tz::Tz;
use roxmltree::{Document, Node};
use url::Url;

use crate::error::ParseError;
use crate::meeting::{MeetingUpdate, sort_updates};

/// Query parameter on entry links that holds the meeting id.
pub const MEETING_ID_PARAM: &str = "ID";

const TITLE_SEPARATOR: &str = " - ";

#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Time zone the feed's dates are written in
    pub time_zone: Tz,
    /// Skip malformed entries instead of failing the whole feed
    pub skip_malformed_entries: bool,
}

/// An entry dropped in lenient mode.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    pub source_id: String,
    pub error: ParseError,
}

/// Parsed feed snapshot, sorted by `source_id`.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub updates: Vec<MeetingUpdate>,
    pub skipped: Vec<SkippedEntry>,
}

/// The fields of an RSS `<item>` the parser cares about.
#[derive(Debug, Default)]
struct RawEntry {
    guid: Option<String>,
    link: Option<String>,
    title: Option<String>,
    pub_date: Option<String>,
    description: Option<String>,
    categories: Vec<String>,
}

impl RawEntry {
    fn from_node(item: Node) -> Self {
        let mut entry = RawEntry::default();

        for child in item.children().filter(|n| n.is_element()) {
            let text = child.text().map(|t| t.trim().to_string());
            match child.tag_name().name() {
                "guid" => entry.guid = text,
                "link" => entry.link = text,
                "title" => entry.title = text,
                "pubDate" => entry.pub_date = text,
                "description" => entry.description = text,
                "category" => entry.categories.extend(text.filter(|t| !t.is_empty())),
                _ => {}
            }
        }

        entry
    }

    fn source_id(&self) -> String {
        self.guid
            .clone()
            .filter(|g| !g.is_empty())
            .or_else(|| self.link.clone())
            .unwrap_or_default()
    }

    fn require<'a>(&self, value: &'a Option<String>, field: &'static str) -> Result<&'a str, ParseError> {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ParseError::MissingField {
                entry: self.source_id(),
                field,
            })
    }
}

/// Parse a whole feed document.
///
/// In strict mode the first malformed entry fails the parse. In lenient mode
/// malformed entries are logged and reported in [`ParsedFeed::skipped`].
pub fn parse_feed(xml: &str, options: &FeedOptions) -> Result<ParsedFeed, ParseError> {
    let doc = Document::parse(xml).map_err(|e| ParseError::Xml(e.to_string()))?;

    let channel = doc
        .descendants()
        .find(|n| n.tag_name().name() == "channel")
        .ok_or(ParseError::MissingChannel)?;

    let mut updates = Vec::new();
    let mut skipped = Vec::new();

    for item in channel.children().filter(|n| n.tag_name().name() == "item") {
        let raw = RawEntry::from_node(item);

        match parse_entry(&raw, options.time_zone) {
            Ok(update) => updates.push(update),
            Err(error) if options.skip_malformed_entries => {
                tracing::warn!(entry = %raw.source_id(), %error, "skipping malformed feed entry");
                skipped.push(SkippedEntry {
                    source_id: raw.source_id(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    sort_updates(&mut updates);
    tracing::debug!(entries = updates.len(), skipped = skipped.len(), "parsed feed");

    Ok(ParsedFeed { updates, skipped })
}

fn parse_entry(raw: &RawEntry, tz: Tz) -> Result<MeetingUpdate, ParseError> {
    let link = raw.require(&raw.link, "link")?;
    let title = raw.require(&raw.title, "title")?;
    let pub_date = raw.require(&raw.pub_date, "pubDate")?;

    let meeting_id = extract_meeting_id(link)?;
    let (name, meeting_type, date_string) = split_title(title)?;
    let date = localize(parse_local_date(date_string)?, tz)?;
    let published_at = parse_published(pub_date, tz)?;

    Ok(MeetingUpdate {
        source_id: raw.source_id(),
        meeting_id,
        date,
        link: link.to_string(),
        name: name.to_string(),
        meeting_type: meeting_type.to_string(),
        published_at,
        summary: raw.description.clone().unwrap_or_default(),
        tags: raw.categories.clone(),
        raw_title: title.to_string(),
    })
}

/// Pull the meeting id out of an entry link's query string.
pub fn extract_meeting_id(link: &str) -> Result<String, ParseError> {
    let url = Url::parse(link).map_err(|_| ParseError::InvalidLink(link.to_string()))?;

    if url.query().is_none_or(str::is_empty) {
        return Err(ParseError::MissingMeetingId(link.to_string()));
    }

    url.query_pairs()
        .find(|(key, _)| key.eq_ignore_ascii_case(MEETING_ID_PARAM))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ParseError::MissingMeetingId(link.to_string()))
}

/// Split `"Name - Type - DateString"` into its three parts.
pub fn split_title(title: &str) -> Result<(&str, &str, &str), ParseError> {
    let parts: Vec<&str> = title.trim().split(TITLE_SEPARATOR).collect();

    match parts.as_slice() {
        [name, meeting_type, date] => Ok((name.trim(), meeting_type.trim(), date.trim())),
        _ => Err(ParseError::MalformedTitle {
            title: title.to_string(),
            parts: parts.len(),
        }),
    }
}
