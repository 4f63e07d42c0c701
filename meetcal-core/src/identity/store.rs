//! Identity store backends.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::identity::PersistedMeeting;

const RECORDS_FILE: &str = "records.json";

/// Document store holding one record per known meeting, keyed by `record_id`.
pub trait MeetingStore: Send + Sync {
    fn list(&self) -> Result<Vec<PersistedMeeting>, StoreError>;
    fn create(&self, record: &PersistedMeeting) -> Result<(), StoreError>;
    fn update(&self, record: &PersistedMeeting) -> Result<(), StoreError>;
    fn delete(&self, record_id: &str) -> Result<(), StoreError>;
}

type Records = BTreeMap<String, PersistedMeeting>;

fn insert_new(records: &mut Records, record: &PersistedMeeting) -> Result<(), StoreError> {
    if records.contains_key(&record.record_id) {
        return Err(StoreError::AlreadyExists(record.record_id.clone()));
    }
    records.insert(record.record_id.clone(), record.clone());
    Ok(())
}

fn replace_existing(records: &mut Records, record: &PersistedMeeting) -> Result<(), StoreError> {
    match records.get_mut(&record.record_id) {
        Some(existing) => {
            *existing = record.clone();
            Ok(())
        }
        None => Err(StoreError::NotFound(record.record_id.clone())),
    }
}

fn remove_existing(records: &mut Records, record_id: &str) -> Result<(), StoreError> {
    records
        .remove(record_id)
        .map(|_| ())
        .ok_or_else(|| StoreError::NotFound(record_id.to_string()))
}

/// In-process store.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = PersistedMeeting>) -> Self {
        MemoryStore {
            records: Mutex::new(
                records
                    .into_iter()
                    .map(|r| (r.record_id.clone(), r))
                    .collect(),
            ),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        // A poisoned map is still consistent: every mutation is a single insert/remove.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MeetingStore for MemoryStore {
    fn list(&self) -> Result<Vec<PersistedMeeting>, StoreError> {
        Ok(self.lock().values().cloned().collect())
    }

    fn create(&self, record: &PersistedMeeting) -> Result<(), StoreError> {
        insert_new(&mut self.lock(), record)
    }

    fn update(&self, record: &PersistedMeeting) -> Result<(), StoreError> {
        replace_existing(&mut self.lock(), record)
    }

    fn delete(&self, record_id: &str) -> Result<(), StoreError> {
        remove_existing(&mut self.lock(), record_id)
    }
}

/// Records kept as a JSON array in `<dir>/records.json`.
///
/// Each mutation rewrites the whole file through a temp file and a rename,
/// so a write either lands completely or not at all.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        Ok(JsonFileStore {
            path: dir.join(RECORDS_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Records, StoreError> {
        if !self.path.exists() {
            return Ok(Records::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Records::new());
        }

        let records: Vec<PersistedMeeting> = serde_json::from_str(&content).map_err(|e| {
            StoreError::Serialization(format!("{}: {}", self.path.display(), e))
        })?;

        Ok(records
            .into_iter()
            .map(|r| (r.record_id.clone(), r))
            .collect())
    }

    fn save(&self, records: &Records) -> Result<(), StoreError> {
        let sorted: Vec<&PersistedMeeting> = records.values().collect();
        let content = serde_json::to_string_pretty(&sorted)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn modify(
        &self,
        op: impl FnOnce(&mut Records) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut records = self.load()?;
        op(&mut records)?;
        self.save(&records)
    }
}

impl MeetingStore for JsonFileStore {
    fn list(&self) -> Result<Vec<PersistedMeeting>, StoreError> {
        Ok(self.load()?.into_values().collect())
    }

    fn create(&self, record: &PersistedMeeting) -> Result<(), StoreError> {
        self.modify(|records| insert_new(records, record))
    }

    fn update(&self, record: &PersistedMeeting) -> Result<(), StoreError> {
        self.modify(|records| replace_existing(records, record))
    }

    fn delete(&self, record_id: &str) -> Result<(), StoreError> {
        self.modify(|records| remove_existing(records, record_id))
    }
}
