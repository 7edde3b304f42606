//! Profile persistence and the write debounce that guards it.

use std::cell::RefCell;
use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::PERSIST_DEBOUNCE_MS;
use crate::error::{AppError, js_message};
use crate::geo::GeoPoint;
use crate::session::participant_id;

const PARTICIPANT_KEY: &str = "fog_participant";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub visited_points: Vec<GeoPoint>,
}

impl ProfileRecord {
    pub fn new(user_id: String) -> Self {
        Self { username: user_id.clone(), user_id, visited_points: Vec::new() }
    }
}

pub trait ProfileStore {
    fn load(&self, user_id: &str) -> Result<Option<ProfileRecord>, AppError>;
    /// Upsert keyed by `record.user_id`.
    fn save(&self, record: &ProfileRecord) -> Result<(), AppError>;
    /// Participant id of the previous visit on this device.
    fn last_participant(&self) -> Result<Option<String>, AppError>;
    fn remember_participant(&self, user_id: &str) -> Result<(), AppError>;
}

fn profile_key(user_id: &str) -> String {
    format!("fog_profile_{user_id}")
}

pub struct LocalProfileStore {
    storage: web_sys::Storage,
}

impl LocalProfileStore {
    pub fn open() -> Result<Self, AppError> {
        let storage = web_sys::window()
            .ok_or(AppError::StorageUnavailable)?
            .local_storage()
            .map_err(|e| AppError::Storage(js_message(&e)))?
            .ok_or(AppError::StorageUnavailable)?;
        Ok(Self { storage })
    }
}

impl ProfileStore for LocalProfileStore {
    fn load(&self, user_id: &str) -> Result<Option<ProfileRecord>, AppError> {
        let raw = self
            .storage
            .get_item(&profile_key(user_id))
            .map_err(|e| AppError::Storage(js_message(&e)))?;
        raw.map(|s| serde_json::from_str(&s).map_err(AppError::from)).transpose()
    }

    fn save(&self, record: &ProfileRecord) -> Result<(), AppError> {
        let raw = serde_json::to_string(record)?;
        self.storage
            .set_item(&profile_key(&record.user_id), &raw)
            .map_err(|e| AppError::Storage(js_message(&e)))
    }

    fn last_participant(&self) -> Result<Option<String>, AppError> {
        let id = self
            .storage
            .get_item(PARTICIPANT_KEY)
            .map_err(|e| AppError::Storage(js_message(&e)))?;
        Ok(id.filter(|id| !id.trim().is_empty()))
    }

    fn remember_participant(&self, user_id: &str) -> Result<(), AppError> {
        self.storage
            .set_item(PARTICIPANT_KEY, user_id)
            .map_err(|e| AppError::Storage(js_message(&e)))
    }
}

/// Keeps the session going when browser storage is unavailable.
#[derive(Default)]
pub struct MemoryProfileStore {
    records: RefCell<HashMap<String, ProfileRecord>>,
    participant: RefCell<Option<String>>,
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self, user_id: &str) -> Result<Option<ProfileRecord>, AppError> {
        Ok(self.records.borrow().get(user_id).cloned())
    }

    fn save(&self, record: &ProfileRecord) -> Result<(), AppError> {
        self.records.borrow_mut().insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    fn last_participant(&self) -> Result<Option<String>, AppError> {
        Ok(self.participant.borrow().clone())
    }

    fn remember_participant(&self, user_id: &str) -> Result<(), AppError> {
        *self.participant.borrow_mut() = Some(user_id.to_string());
        Ok(())
    }
}

pub fn open_store() -> Box<dyn ProfileStore> {
    match LocalProfileStore::open() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("profile store: {e}, keeping progress in memory");
            Box::new(MemoryProfileStore::default())
        }
    }
}

/// Profile of the returning participant, or a fresh one that is remembered
/// for the next visit.
pub fn resume_or_create<R: Rng + ?Sized>(store: &dyn ProfileStore, rng: &mut R) -> Result<ProfileRecord, AppError> {
    if let Some(id) = store.last_participant()? {
        let record = store.load(&id)?.unwrap_or_else(|| ProfileRecord::new(id));
        log::info!("participant {} resumed ({} visited points)", record.user_id, record.visited_points.len());
        return Ok(record);
    }
    let record = ProfileRecord::new(participant_id(rng));
    store.save(&record)?;
    store.remember_participant(&record.user_id)?;
    log::info!("participant {} created", record.user_id);
    Ok(record)
}

/// Batches path writes: at most one per debounce window, none during missions.
#[derive(Debug, Clone)]
pub struct PersistScheduler {
    interval_ms: f64,
    last_write_ms: Option<f64>,
    dirty: bool,
}

impl Default for PersistScheduler {
    fn default() -> Self {
        Self { interval_ms: PERSIST_DEBOUNCE_MS, last_write_ms: None, dirty: false }
    }
}

impl PersistScheduler {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn should_flush(&self, now_ms: f64, mission_active: bool) -> bool {
        self.dirty
            && !mission_active
            && self.last_write_ms.is_none_or(|last| now_ms - last >= self.interval_ms)
    }

    pub fn flushed(&mut self, now_ms: f64) {
        self.dirty = false;
        self.last_write_ms = Some(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn memory_store_upserts() {
        let store = MemoryProfileStore::default();
        assert!(store.load("p1").unwrap().is_none());
        let mut rec = ProfileRecord { user_id: "p1".into(), username: "P1".into(), visited_points: vec![] };
        store.save(&rec).unwrap();
        rec.visited_points.push(GeoPoint::new(8.65, 49.87));
        store.save(&rec).unwrap();
        assert_eq!(store.load("p1").unwrap().map(|r| r.visited_points.len()), Some(1));
    }

    #[test]
    fn record_wire_format() {
        let rec = ProfileRecord {
            user_id: "p1".into(),
            username: "P1".into(),
            visited_points: vec![GeoPoint::new(8.5, 49.5)],
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["visited_points"][0]["lng"], 8.5);
        assert_eq!(json["username"], "P1");
    }

    #[test]
    fn returning_participant_finds_saved_path() {
        let store = MemoryProfileStore::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut first = resume_or_create(&store, &mut rng).unwrap();
        assert!(first.visited_points.is_empty());

        first.visited_points.push(GeoPoint::new(8.65, 49.87));
        store.save(&first).unwrap();

        let again = resume_or_create(&store, &mut rng).unwrap();
        assert_eq!(again.user_id, first.user_id);
        assert_eq!(again.visited_points, first.visited_points);
    }

    #[test]
    fn remembered_id_without_record_starts_empty() {
        let store = MemoryProfileStore::default();
        store.remember_participant("P-00C0DE").unwrap();
        let record = resume_or_create(&store, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(record, ProfileRecord::new("P-00C0DE".into()));
    }

    #[test]
    fn nothing_to_flush_when_clean() {
        let s = PersistScheduler::default();
        assert!(!s.should_flush(10_000.0, false));
    }

    #[test]
    fn flushes_at_most_every_five_seconds() {
        let mut s = PersistScheduler::default();
        s.mark_dirty();
        assert!(s.should_flush(0.0, false));
        s.flushed(0.0);
        s.mark_dirty();
        assert!(!s.should_flush(4_999.0, false));
        assert!(s.should_flush(5_000.0, false));
    }

    #[test]
    fn never_flushes_during_mission() {
        let mut s = PersistScheduler::default();
        s.mark_dirty();
        assert!(!s.should_flush(60_000.0, true));
        assert!(s.should_flush(60_000.0, false));
    }
}
