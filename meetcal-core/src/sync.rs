//! One feed-to-calendar sync.
//!
//! Stages run in sequence: parse the feed, aggregate entries into meetings,
//! reconcile durable identity, compute the calendar plan, then apply it.

use std::collections::BTreeMap;

use crate::calendar_event::to_calendar_events;
use crate::config::SyncSettings;
use crate::diff::{ApplyPlan, compute_plan};
use crate::error::SyncResult;
use crate::executor::{ApplySummary, execute};
use crate::feed::{SkippedEntry, parse_feed};
use crate::identity::{Identity, PersistedMeeting, ReconcileReport, Reconciler, pass_through};
use crate::meeting::aggregate;
use crate::remote::CalendarClient;

/// Whether `prepare` may write to the identity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityWrite {
    Commit,
    /// Compute everything without touching the store
    Preview,
}

/// Everything computed before the calendar is touched.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// Feed entries that parsed successfully
    pub entry_count: usize,
    pub skipped: Vec<SkippedEntry>,
    /// Current meetings with their record ids, keyed by meeting id
    pub meetings: BTreeMap<String, PersistedMeeting>,
    pub identity: ReconcileReport,
    pub apply: ApplyPlan,
}

pub struct MeetingSync<'a, C> {
    settings: &'a SyncSettings,
    identity: Identity<'a>,
    calendar: &'a C,
}

impl<'a, C: CalendarClient> MeetingSync<'a, C> {
    pub fn new(settings: &'a SyncSettings, identity: Identity<'a>, calendar: &'a C) -> Self {
        MeetingSync {
            settings,
            identity,
            calendar,
        }
    }

    pub async fn prepare(&self, feed_xml: &str, write: IdentityWrite) -> SyncResult<SyncPlan> {
        let parsed = parse_feed(feed_xml, &self.settings.feed_options())?;
        let entry_count = parsed.updates.len();

        let current = aggregate(parsed.updates);
        tracing::debug!(meetings = current.len(), "aggregated meetings");

        let reconciled = match (self.identity, write) {
            (Identity::Ephemeral, _) => pass_through(&current),
            (Identity::Persistent(store), IdentityWrite::Commit) => {
                Reconciler::new(store).reconcile(&current)?
            }
            (Identity::Persistent(store), IdentityWrite::Preview) => {
                Reconciler::new(store).preview(&current)?
            }
        };
        let report = &reconciled.report;
        tracing::debug!(
            added = report.added.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            deleted = report.deleted.len(),
            duplicates = report.duplicates.len(),
            "reconciled identity"
        );

        let desired = to_calendar_events(
            &reconciled.meetings,
            &self.settings.event_id_prefix,
            self.settings.time_zone,
        );
        let remote = self.calendar.list_events().await?;
        let apply = compute_plan(&desired, &remote);

        let (created, updated, deleted) = apply.counts();
        tracing::debug!(
            remote = remote.len(),
            created,
            updated,
            deleted,
            "computed calendar plan"
        );

        Ok(SyncPlan {
            entry_count,
            skipped: parsed.skipped,
            meetings: reconciled.meetings,
            identity: reconciled.report,
            apply,
        })
    }

    pub async fn apply(&self, plan: &SyncPlan) -> SyncResult<ApplySummary> {
        Ok(execute(self.calendar, &plan.apply).await?)
    }

    /// Prepare with committed identity, then apply.
    pub async fn run(&self, feed_xml: &str) -> SyncResult<(SyncPlan, ApplySummary)> {
        let plan = self.prepare(feed_xml, IdentityWrite::Commit).await?;
        let summary = self.apply(&plan).await?;
        Ok((plan, summary))
    }
}
