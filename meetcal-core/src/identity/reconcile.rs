//! Reconcile the current feed snapshot against the identity store.

use std::collections::{BTreeMap, HashSet};

use crate::error::StoreError;
use crate::identity::record_id::{assign_record_id, random_record_id};
use crate::identity::{MeetingStore, PersistedMeeting};
use crate::meeting::Meeting;

/// What has to change in the store to match the current snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePlan {
    /// Meetings seen for the first time; they still need a record id
    pub to_add: Vec<Meeting>,
    /// Known meetings whose content changed, carrying their existing record id
    pub to_update: Vec<PersistedMeeting>,
    /// Known meetings whose stored document already matches
    pub unchanged: Vec<PersistedMeeting>,
    /// Stored records whose meeting left the feed
    pub to_delete: Vec<PersistedMeeting>,
    /// Extra records for a meeting id that already has a kept record
    pub duplicates: Vec<PersistedMeeting>,
}

impl ReconcilePlan {
    pub fn new(current: &BTreeMap<String, Meeting>, persisted: Vec<PersistedMeeting>) -> Self {
        let mut persisted = persisted;
        persisted.sort_by(|a, b| a.record_id.cmp(&b.record_id));

        let mut known: BTreeMap<String, PersistedMeeting> = BTreeMap::new();
        let mut to_delete = Vec::new();
        let mut duplicates = Vec::new();

        for record in persisted {
            if !current.contains_key(record.meeting_id()) {
                to_delete.push(record);
            } else if known.contains_key(record.meeting_id()) {
                duplicates.push(record);
            } else {
                known.insert(record.meeting_id().to_string(), record);
            }
        }

        let mut to_add = Vec::new();
        let mut to_update = Vec::new();
        let mut unchanged = Vec::new();

        for (meeting_id, meeting) in current {
            match known.remove(meeting_id) {
                None => to_add.push(meeting.clone()),
                Some(stored) if stored.meeting == *meeting => unchanged.push(stored),
                Some(stored) => to_update.push(PersistedMeeting::new(stored.record_id, meeting.clone())),
            }
        }

        ReconcilePlan {
            to_add,
            to_update,
            unchanged,
            to_delete,
            duplicates,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty()
            && self.to_update.is_empty()
            && self.to_delete.is_empty()
            && self.duplicates.is_empty()
    }
}

/// Meeting ids touched by a reconciliation, per category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub deleted: Vec<String>,
    /// Record ids of removed duplicates; their meetings are still current
    pub duplicates: Vec<String>,
}

impl ReconcileReport {
    /// True when the store was (or would be) left untouched.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty()
            && self.updated.is_empty()
            && self.deleted.is_empty()
            && self.duplicates.is_empty()
    }
}

/// Post-reconciliation identity state.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Every current meeting with its record id, keyed by `meeting_id`
    pub meetings: BTreeMap<String, PersistedMeeting>,
    pub report: ReconcileReport,
}

/// The single writer of durable identity.
pub struct Reconciler<'a> {
    store: &'a dyn MeetingStore,
    next_id: Box<dyn FnMut() -> String + Send + 'a>,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn MeetingStore) -> Self {
        Reconciler {
            store,
            next_id: Box::new(random_record_id),
        }
    }

    /// Replace the random id source (tests use this to force collisions).
    pub fn with_id_source(mut self, next_id: impl FnMut() -> String + Send + 'a) -> Self {
        self.next_id = Box::new(next_id);
        self
    }

    pub fn plan(&self, current: &BTreeMap<String, Meeting>) -> Result<ReconcilePlan, StoreError> {
        Ok(ReconcilePlan::new(current, self.store.list()?))
    }

    /// Bring the store in line with `current`.
    ///
    /// Writes go add, delete, update. A failed write aborts; earlier writes
    /// stay in place and the next run converges from the feed again.
    pub fn reconcile(&mut self, current: &BTreeMap<String, Meeting>) -> Result<Reconciled, StoreError> {
        let plan = self.plan(current)?;
        self.apply(plan, true)
    }

    /// Same as [`Reconciler::reconcile`] without writing. New meetings get
    /// provisional record ids that are never stored.
    pub fn preview(&mut self, current: &BTreeMap<String, Meeting>) -> Result<Reconciled, StoreError> {
        let plan = self.plan(current)?;
        self.apply(plan, false)
    }

    fn apply(&mut self, plan: ReconcilePlan, write: bool) -> Result<Reconciled, StoreError> {
        let mut taken: HashSet<String> = plan
            .to_update
            .iter()
            .chain(&plan.unchanged)
            .chain(&plan.to_delete)
            .chain(&plan.duplicates)
            .map(|r| r.record_id.clone())
            .collect();

        let mut report = ReconcileReport::default();
        let mut meetings = BTreeMap::new();

        for meeting in plan.to_add {
            let record_id = assign_record_id(&taken, &mut self.next_id)?;
            taken.insert(record_id.clone());

            let record = PersistedMeeting::new(record_id, meeting);
            if write {
                self.store.create(&record)?;
            }
            tracing::debug!(meeting_id = %record.meeting_id(), record_id = %record.record_id, "identity added");
            report.added.push(record.meeting_id().to_string());
            meetings.insert(record.meeting_id().to_string(), record);
        }

        for record in plan.to_delete {
            if write {
                self.store.delete(&record.record_id)?;
            }
            tracing::debug!(meeting_id = %record.meeting_id(), record_id = %record.record_id, "identity deleted");
            report.deleted.push(record.meeting_id().to_string());
        }

        for record in plan.duplicates {
            if write {
                self.store.delete(&record.record_id)?;
            }
            tracing::debug!(meeting_id = %record.meeting_id(), record_id = %record.record_id, "duplicate identity deleted");
            report.duplicates.push(record.record_id);
        }

        for record in plan.to_update {
            if write {
                self.store.update(&record)?;
            }
            report.updated.push(record.meeting_id().to_string());
            meetings.insert(record.meeting_id().to_string(), record);
        }

        for record in plan.unchanged {
            report.unchanged.push(record.meeting_id().to_string());
            meetings.insert(record.meeting_id().to_string(), record);
        }

        Ok(Reconciled { meetings, report })
    }
}

/// Identity without a store: every meeting's record id is its meeting id.
pub fn pass_through(current: &BTreeMap<String, Meeting>) -> Reconciled {
    let meetings: BTreeMap<String, PersistedMeeting> = current
        .iter()
        .map(|(id, meeting)| (id.clone(), PersistedMeeting::new(id.clone(), meeting.clone())))
        .collect();

    Reconciled {
        report: ReconcileReport {
            unchanged: meetings.keys().cloned().collect(),
            ..Default::default()
        },
        meetings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryStore;
    use crate::meeting::aggregate;
    use crate::meeting::tests::update;

    fn snapshot(ids: &[&str]) -> BTreeMap<String, Meeting> {
        aggregate(
            ids.iter()
                .map(|id| update(&format!("s{id}"), id, "Board - Regular - June 5 2024"))
                .collect(),
        )
    }

    fn sorted(mut ids: Vec<String>) -> Vec<String> {
        ids.sort();
        ids
    }

    #[test]
    fn test_first_run_adds_everything() {
        let store = MemoryStore::new();
        let mut reconciler = Reconciler::new(&store);

        let result = reconciler.reconcile(&snapshot(&["100", "200"])).unwrap();

        assert_eq!(result.report.added, vec!["100", "200"]);
        assert!(result.report.deleted.is_empty());
        assert_eq!(store.list().unwrap().len(), 2);
        assert_ne!(result.meetings["100"].record_id, result.meetings["200"].record_id);
    }

    #[test]
    fn test_reconcile_is_set_partition() {
        let store = MemoryStore::new();
        Reconciler::new(&store)
            .reconcile(&snapshot(&["100", "200", "300"]))
            .unwrap();

        let mut current = snapshot(&["200", "300", "400"]);
        current.get_mut("300").unwrap().name = "Renamed".to_string();

        let result = Reconciler::new(&store).reconcile(&current).unwrap();
        let report = &result.report;

        assert_eq!(report.added, vec!["400"]);
        assert_eq!(report.updated, vec!["300"]);
        assert_eq!(report.unchanged, vec!["200"]);
        assert_eq!(report.deleted, vec!["100"]);

        let mut covered: Vec<String> = report
            .added
            .iter()
            .chain(&report.updated)
            .chain(&report.unchanged)
            .cloned()
            .collect();
        covered = sorted(covered);
        assert_eq!(covered, current.keys().cloned().collect::<Vec<_>>());
        assert!(report.deleted.iter().all(|id| !current.contains_key(id)));
    }

    #[test]
    fn test_record_ids_survive_updates() {
        let store = MemoryStore::new();
        let first = Reconciler::new(&store).reconcile(&snapshot(&["100"])).unwrap();

        let mut changed = snapshot(&["100"]);
        changed.get_mut("100").unwrap().link = "https://example.gov/moved?ID=100".to_string();
        let second = Reconciler::new(&store).reconcile(&changed).unwrap();

        assert_eq!(second.report.updated, vec!["100"]);
        assert_eq!(
            first.meetings["100"].record_id,
            second.meetings["100"].record_id
        );
        let stored = store.list().unwrap();
        assert_eq!(stored[0].meeting.link, "https://example.gov/moved?ID=100");
    }

    #[test]
    fn test_second_run_without_changes_is_noop() {
        let store = MemoryStore::new();
        let current = snapshot(&["100", "200"]);

        let first = Reconciler::new(&store).reconcile(&current).unwrap();
        let second = Reconciler::new(&store).reconcile(&current).unwrap();

        assert!(!first.report.is_noop());
        assert!(second.report.is_noop());
        assert_eq!(second.report.unchanged, vec!["100", "200"]);
        assert_eq!(
            first.meetings["200"].record_id,
            second.meetings["200"].record_id
        );
    }

    #[test]
    fn test_new_ids_avoid_existing_ones() {
        let store = MemoryStore::new();
        Reconciler::new(&store)
            .with_id_source(|| "taken".to_string())
            .reconcile(&snapshot(&["100"]))
            .unwrap();

        let mut ids = vec!["fresh", "taken", "taken"];
        let result = Reconciler::new(&store)
            .with_id_source(move || ids.pop().unwrap().to_string())
            .reconcile(&snapshot(&["100", "200"]))
            .unwrap();

        assert_eq!(result.meetings["100"].record_id, "taken");
        assert_eq!(result.meetings["200"].record_id, "fresh");
    }

    #[test]
    fn test_ids_assigned_in_same_run_do_not_collide() {
        let store = MemoryStore::new();
        let mut ids = vec!["b", "a", "a"];

        let result = Reconciler::new(&store)
            .with_id_source(move || ids.pop().unwrap().to_string())
            .reconcile(&snapshot(&["100", "200"]))
            .unwrap();

        assert_eq!(result.meetings["100"].record_id, "a");
        assert_eq!(result.meetings["200"].record_id, "b");
    }

    #[test]
    fn test_id_exhaustion_aborts() {
        let store = MemoryStore::new();
        Reconciler::new(&store)
            .with_id_source(|| "same".to_string())
            .reconcile(&snapshot(&["100"]))
            .unwrap();

        let result = Reconciler::new(&store)
            .with_id_source(|| "same".to_string())
            .reconcile(&snapshot(&["100", "200"]));

        assert!(matches!(result, Err(StoreError::IdExhausted(_))));
    }

    #[test]
    fn test_duplicate_records_for_one_meeting_are_deleted() {
        let meeting = snapshot(&["100"]).remove("100").unwrap();
        let store = MemoryStore::with_records([
            PersistedMeeting::new("a1", meeting.clone()),
            PersistedMeeting::new("b2", meeting),
        ]);

        let result = Reconciler::new(&store).reconcile(&snapshot(&["100"])).unwrap();

        assert_eq!(result.meetings["100"].record_id, "a1");
        assert!(result.report.deleted.is_empty());
        assert_eq!(result.report.duplicates, vec!["b2"]);
        assert_eq!(result.report.unchanged, vec!["100"]);
        assert!(!result.report.is_noop());
        assert_eq!(store.list().unwrap().len(), 1);

        let again = Reconciler::new(&store).reconcile(&snapshot(&["100"])).unwrap();
        assert!(again.report.is_noop());
    }

    #[test]
    fn test_duplicates_do_not_mask_removed_meetings() {
        let board = snapshot(&["100"]).remove("100").unwrap();
        let council = snapshot(&["200"]).remove("200").unwrap();
        let store = MemoryStore::with_records([
            PersistedMeeting::new("a1", board.clone()),
            PersistedMeeting::new("b2", board),
            PersistedMeeting::new("c3", council),
        ]);

        let plan = Reconciler::new(&store).plan(&snapshot(&["100"])).unwrap();

        assert_eq!(plan.to_delete.len(), 1);
        assert_eq!(plan.to_delete[0].record_id, "c3");
        assert_eq!(plan.duplicates.len(), 1);
        assert_eq!(plan.duplicates[0].record_id, "b2");
    }

    #[test]
    fn test_unchanged_meetings_keep_their_category_across_snapshots() {
        let store = MemoryStore::new();
        Reconciler::new(&store)
            .reconcile(&snapshot(&["100", "200"]))
            .unwrap();

        // "200" moves position in the snapshot but its content is the same
        let result = Reconciler::new(&store)
            .reconcile(&snapshot(&["200"]))
            .unwrap();

        assert_eq!(result.report.unchanged, vec!["200"]);
        assert!(result.report.updated.is_empty());
        assert_eq!(result.report.deleted, vec!["100"]);
    }

    #[test]
    fn test_preview_does_not_write() {
        let store = MemoryStore::new();

        let result = Reconciler::new(&store).preview(&snapshot(&["100"])).unwrap();

        assert_eq!(result.report.added, vec!["100"]);
        assert!(result.meetings.contains_key("100"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_pass_through_uses_meeting_id() {
        let result = pass_through(&snapshot(&["100", "200"]));

        assert_eq!(result.meetings["100"].record_id, "100");
        assert_eq!(result.meetings["200"].record_id, "200");
        assert!(result.report.is_noop());
    }
}
