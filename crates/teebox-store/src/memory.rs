//! In-process document store backed by `HashMap`s.
//!
//! This is the reference implementation of [`DocumentStore`] used by
//! tests and demos. One write lock spans every mutation, which is what
//! gives [`DocumentStore::settle`] its all-or-nothing guarantee here.

use std::collections::HashMap;
use std::sync::Arc;

use teebox_model::{BillingConfig, CountryCode, GameRecord, Room, StoreKey, StoreProfile};
use tokio::sync::{watch, RwLock};

use crate::{DocumentStore, StoreError};

/// One store's profile document plus its live-update channel.
struct StoreDoc {
    profile: StoreProfile,
    updates: watch::Sender<Option<StoreProfile>>,
}

impl StoreDoc {
    fn guard_version(&self, expected: u64) -> Result<(), StoreError> {
        if self.profile.version != expected {
            return Err(StoreError::Conflict {
                expected,
                actual: self.profile.version,
            });
        }
        Ok(())
    }

    /// Bumps the version and notifies subscribers. Call after mutating
    /// the profile.
    fn commit(&mut self, expected: u64) -> u64 {
        self.profile.version = expected + 1;
        let _ = self.updates.send(Some(self.profile.clone()));
        self.profile.version
    }
}

#[derive(Default)]
struct Inner {
    profiles: RwLock<HashMap<StoreKey, StoreDoc>>,
    ledgers: RwLock<HashMap<CountryCode, Vec<GameRecord>>>,
}

/// An in-memory [`DocumentStore`].
///
/// Cheap to clone — clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) a store profile document. This stands in
    /// for the signup flow, which provisions the document elsewhere.
    pub async fn seed(&self, key: StoreKey, profile: StoreProfile) {
        let mut profiles = self.inner.profiles.write().await;
        let updates = watch::Sender::new(Some(profile.clone()));
        profiles.insert(key, StoreDoc { profile, updates });
    }
}

impl DocumentStore for MemoryStore {
    async fn load_profile(&self, key: &StoreKey) -> Result<Option<StoreProfile>, StoreError> {
        let profiles = self.inner.profiles.read().await;
        Ok(profiles.get(key).map(|doc| doc.profile.clone()))
    }

    async fn write_rooms(
        &self,
        key: &StoreKey,
        rooms: Vec<Room>,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut profiles = self.inner.profiles.write().await;
        let doc = profiles
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        doc.guard_version(expected_version)?;

        doc.profile.rooms = rooms;
        let version = doc.commit(expected_version);
        tracing::debug!(key = %key, version, "room list written");
        Ok(version)
    }

    async fn write_config(
        &self,
        key: &StoreKey,
        config: BillingConfig,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut profiles = self.inner.profiles.write().await;
        let doc = profiles
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        doc.guard_version(expected_version)?;

        doc.profile.config = config;
        let version = doc.commit(expected_version);
        tracing::debug!(key = %key, version, "billing config written");
        Ok(version)
    }

    async fn settle(
        &self,
        key: &StoreKey,
        rooms: Vec<Room>,
        record: GameRecord,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        // Hold both write locks for the whole settle so the ledger
        // append and the room reset land together or not at all.
        let mut profiles = self.inner.profiles.write().await;
        let mut ledgers = self.inner.ledgers.write().await;

        let doc = profiles
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        doc.guard_version(expected_version)?;

        let record_id = record.id.clone();
        ledgers.entry(key.country.clone()).or_default().push(record);
        doc.profile.rooms = rooms;
        let version = doc.commit(expected_version);
        tracing::info!(key = %key, record = %record_id, version, "settlement committed");
        Ok(version)
    }

    async fn subscribe(
        &self,
        key: &StoreKey,
    ) -> Result<watch::Receiver<Option<StoreProfile>>, StoreError> {
        let profiles = self.inner.profiles.read().await;
        let doc = profiles
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        Ok(doc.updates.subscribe())
    }

    async fn settlements(&self, country: &CountryCode) -> Result<Vec<GameRecord>, StoreError> {
        let ledgers = self.inner.ledgers.read().await;
        Ok(ledgers.get(country).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use teebox_model::StoreId;

    fn key() -> StoreKey {
        StoreKey::new(CountryCode::normalize("KR"), "pro@links.kr")
    }

    fn profile_with_rooms(n: u32) -> StoreProfile {
        let mut profile = StoreProfile::new(BillingConfig::default());
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        for i in 1..=n {
            profile.rooms.push(Room::numbered(i, 30_000, created));
        }
        profile
    }

    fn record_for(room: &Room) -> GameRecord {
        let start = Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap();
        GameRecord::settle(
            format!("game_{}_test", room.id),
            room,
            StoreId::from_email("pro@links.kr"),
            start,
            start + chrono::Duration::minutes(25),
            10_000,
            start + chrono::Duration::minutes(25),
        )
    }

    #[tokio::test]
    async fn test_load_missing_profile_is_none() {
        let store = MemoryStore::new();
        assert!(store.load_profile(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seed_and_load_round_trip() {
        let store = MemoryStore::new();
        store.seed(key(), profile_with_rooms(2)).await;

        let profile = store.load_profile(&key()).await.unwrap().unwrap();
        assert_eq!(profile.rooms.len(), 2);
        assert_eq!(profile.version, 0);
    }

    #[tokio::test]
    async fn test_write_rooms_bumps_version() {
        let store = MemoryStore::new();
        store.seed(key(), profile_with_rooms(2)).await;

        let v1 = store
            .write_rooms(&key(), profile_with_rooms(3).rooms, 0)
            .await
            .unwrap();
        assert_eq!(v1, 1);

        let profile = store.load_profile(&key()).await.unwrap().unwrap();
        assert_eq!(profile.rooms.len(), 3);
        assert_eq!(profile.version, 1);
    }

    #[tokio::test]
    async fn test_stale_write_is_rejected() {
        let store = MemoryStore::new();
        store.seed(key(), profile_with_rooms(2)).await;
        store
            .write_rooms(&key(), profile_with_rooms(2).rooms, 0)
            .await
            .unwrap();

        // Second writer still holds version 0 — must lose.
        let result = store
            .write_rooms(&key(), profile_with_rooms(5).rooms, 0)
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Conflict { expected: 0, actual: 1 })
        ));
    }

    #[tokio::test]
    async fn test_write_rooms_unknown_store() {
        let store = MemoryStore::new();
        let result = store.write_rooms(&key(), vec![], 0).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_settle_commits_ledger_and_rooms_together() {
        let store = MemoryStore::new();
        let profile = profile_with_rooms(2);
        let mut rooms = profile.rooms.clone();
        let record = record_for(&rooms[0]);
        store.seed(key(), profile).await;

        rooms[0].release();
        store.settle(&key(), rooms, record, 0).await.unwrap();

        let ledger = store.settlements(&key().country).await.unwrap();
        assert_eq!(ledger.len(), 1);
        let profile = store.load_profile(&key()).await.unwrap().unwrap();
        assert_eq!(profile.version, 1);
    }

    #[tokio::test]
    async fn test_settle_conflict_leaves_ledger_untouched() {
        let store = MemoryStore::new();
        let profile = profile_with_rooms(2);
        let rooms = profile.rooms.clone();
        let record = record_for(&rooms[0]);
        store.seed(key(), profile).await;

        // Move the document past version 0 first.
        store.write_rooms(&key(), rooms.clone(), 0).await.unwrap();

        let result = store.settle(&key(), rooms, record, 0).await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert!(store.settlements(&key().country).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_delivers_latest_profile() {
        let store = MemoryStore::new();
        store.seed(key(), profile_with_rooms(1)).await;

        let mut rx = store.subscribe(&key()).await.unwrap();
        store
            .write_rooms(&key(), profile_with_rooms(4).rooms, 0)
            .await
            .unwrap();

        rx.changed().await.unwrap();
        let latest = rx.borrow().clone().unwrap();
        assert_eq!(latest.rooms.len(), 4);
        assert_eq!(latest.version, 1);
    }

    #[tokio::test]
    async fn test_subscribe_unknown_store() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.subscribe(&key()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ledgers_are_partitioned_by_country() {
        let store = MemoryStore::new();
        let profile = profile_with_rooms(1);
        let rooms = profile.rooms.clone();
        let record = record_for(&rooms[0]);
        store.seed(key(), profile).await;
        store.settle(&key(), rooms, record, 0).await.unwrap();

        let other = CountryCode::normalize("US");
        assert!(store.settlements(&other).await.unwrap().is_empty());
        assert_eq!(store.settlements(&key().country).await.unwrap().len(), 1);
    }
}
