//! The persistence-backed billing engine.
//!
//! One `BillingEngine` serves one store. Every operation re-reads the
//! profile document, applies the transition, and writes back with the
//! version it read, so a concurrent write to the same store surfaces as
//! [`teebox_store::StoreError::Conflict`] instead of silently clobbering
//! the other operator's view.

use chrono::{DateTime, Utc};
use rand::Rng;
use teebox_model::{BillingConfig, GameRecord, Room, RoomId, StoreKey, StoreProfile};
use teebox_store::DocumentStore;

use crate::{fee, BillingError};

/// The billing engine for a single store.
///
/// Generic over the [`DocumentStore`] so tests run against the
/// in-memory store and production against a real driver.
pub struct BillingEngine<S> {
    store: S,
    key: StoreKey,
}

impl<S: DocumentStore> BillingEngine<S> {
    pub fn new(store: S, key: StoreKey) -> Self {
        Self { store, key }
    }

    pub fn key(&self) -> &StoreKey {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads this store's profile, failing if none exists yet.
    pub async fn profile(&self) -> Result<StoreProfile, BillingError> {
        self.store
            .load_profile(&self.key)
            .await?
            .ok_or(BillingError::ConfigurationMissing)
    }

    // -----------------------------------------------------------------
    // Session start
    // -----------------------------------------------------------------

    /// Starts a session in an available room, stamping the start time
    /// with the current wall clock.
    pub async fn start_session(&self, room_id: &RoomId) -> Result<Room, BillingError> {
        self.start_session_at(room_id, Utc::now()).await
    }

    /// Starts a session with an explicit start instant.
    ///
    /// The start time is captured exactly once here; every later fee
    /// or elapsed-time reading derives from it.
    pub async fn start_session_at(
        &self,
        room_id: &RoomId,
        now: DateTime<Utc>,
    ) -> Result<Room, BillingError> {
        let mut profile = self.profile().await?;
        let room = profile
            .room_mut(room_id)
            .ok_or_else(|| BillingError::RoomNotFound(room_id.clone()))?;

        if !room.status.is_available() {
            return Err(BillingError::RoomUnavailable {
                room: room_id.clone(),
                status: room.status,
            });
        }

        room.occupy(now);
        let started = room.clone();

        let version = profile.version;
        self.store
            .write_rooms(&self.key, profile.rooms, version)
            .await?;

        tracing::info!(store = %self.key, room = %room_id, "session started");
        Ok(started)
    }

    // -----------------------------------------------------------------
    // Session end / settlement
    // -----------------------------------------------------------------

    /// Settles the active session in a room at the current wall clock.
    pub async fn end_session(&self, room_id: &RoomId) -> Result<GameRecord, BillingError> {
        self.end_session_at(room_id, Utc::now()).await
    }

    /// Settles the active session with an explicit end instant.
    ///
    /// Computes the step-function fee, writes exactly one immutable
    /// ledger record, and releases the room. The ledger append and the
    /// room reset go through a single store transaction, so a crash
    /// cannot bill a session without recording it (or vice versa).
    pub async fn end_session_at(
        &self,
        room_id: &RoomId,
        now: DateTime<Utc>,
    ) -> Result<GameRecord, BillingError> {
        let mut profile = self.profile().await?;
        let room = profile
            .room(room_id)
            .cloned()
            .ok_or_else(|| BillingError::RoomNotFound(room_id.clone()))?;

        // A room that is not occupied, or occupied without a start
        // stamp, has nothing settleable. Never default to a zero-length
        // session here.
        if !room.status.is_occupied() {
            return Err(BillingError::InvalidSession(room_id.clone()));
        }
        let start = room
            .game_start_time
            .ok_or_else(|| BillingError::InvalidSession(room_id.clone()))?;

        let total_fee = fee::accrued_fee(&room, &profile.config, now)?;
        let record = GameRecord::settle(
            settlement_id(room_id),
            &room,
            self.key.store_id(),
            start,
            now,
            total_fee,
            now,
        );

        if let Some(room) = profile.room_mut(room_id) {
            room.release();
        }

        let version = profile.version;
        self.store
            .settle(&self.key, profile.rooms, record.clone(), version)
            .await?;

        tracing::info!(
            store = %self.key,
            room = %room_id,
            fee = total_fee,
            usage_minutes = record.usage_minutes,
            "session settled"
        );
        Ok(record)
    }

    // -----------------------------------------------------------------
    // Structural changes
    // -----------------------------------------------------------------

    /// Resizes the store's room list to `target_count`.
    ///
    /// Growth appends fresh available rooms numbered from the current
    /// high end; shrinkage truncates from the highest number, dropping
    /// any in-progress sessions on the removed rooms. When the count is
    /// unchanged, every room's cached hourly rate is re-stamped from
    /// the current config.
    ///
    /// The config and room writes are two sequential guarded writes,
    /// not one transaction: a crash between them leaves the room list
    /// one version behind the config until the next room write. The
    /// version token still excludes concurrent writers.
    pub async fn adjust_room_count(&self, target_count: u32) -> Result<Vec<Room>, BillingError> {
        if !BillingConfig::room_count_in_range(target_count) {
            return Err(BillingError::RoomCountOutOfRange(target_count));
        }

        let mut profile = self.profile().await?;
        let hourly_rate = profile
            .config
            .hourly_rate()
            .ok_or(BillingError::ConfigurationMissing)?;
        let current = profile.rooms.len() as u32;

        if current < target_count {
            let now = Utc::now();
            for number in current + 1..=target_count {
                profile.rooms.push(Room::numbered(number, hourly_rate, now));
            }
            tracing::info!(
                store = %self.key,
                added = target_count - current,
                "rooms added"
            );
        } else if current > target_count {
            for dropped in &profile.rooms[target_count as usize..] {
                if dropped.status.is_occupied() {
                    tracing::warn!(
                        store = %self.key,
                        room = %dropped.id,
                        "dropping occupied room; its in-progress session is lost"
                    );
                }
            }
            profile.rooms.truncate(target_count as usize);
            tracing::info!(
                store = %self.key,
                removed = current - target_count,
                "rooms removed from the high end"
            );
        } else {
            for room in &mut profile.rooms {
                room.hourly_rate = hourly_rate;
            }
        }

        let config = BillingConfig {
            room_count: target_count,
            ..profile.config
        };
        let version = self
            .store
            .write_config(&self.key, config, profile.version)
            .await?;
        self.store
            .write_rooms(&self.key, profile.rooms.clone(), version)
            .await?;
        Ok(profile.rooms)
    }

    /// Applies new billing settings and re-stamps the cached hourly
    /// rate on every room.
    ///
    /// Room status and start times are untouched: an in-progress
    /// session keeps billing, and its next fee read uses the *new*
    /// config for the entire elapsed duration. Billing config is a
    /// property of "now", not of session start.
    ///
    /// Like [`adjust_room_count`](Self::adjust_room_count), this is
    /// two sequential guarded writes; a crash in between leaves stale
    /// `hourly_rate` caches that heal on the next room write. Fees are
    /// unaffected, they never read the cache.
    pub async fn apply_rate_change(
        &self,
        rate_per_interval: u64,
        time_interval: u32,
    ) -> Result<Vec<Room>, BillingError> {
        let mut profile = self.profile().await?;
        let config = BillingConfig {
            rate_per_interval,
            time_interval,
            room_count: profile.config.room_count,
        };
        let hourly_rate = config
            .hourly_rate()
            .ok_or(BillingError::ConfigurationMissing)?;

        let version = self
            .store
            .write_config(&self.key, config, profile.version)
            .await?;

        for room in &mut profile.rooms {
            room.hourly_rate = hourly_rate;
        }
        self.store
            .write_rooms(&self.key, profile.rooms.clone(), version)
            .await?;

        tracing::info!(
            store = %self.key,
            rate_per_interval,
            time_interval,
            hourly_rate,
            "billing rates changed"
        );
        Ok(profile.rooms)
    }
}

/// Ledger document id for a settlement. The random suffix (rather than
/// a wall-clock one) keeps rapid successive settlements of the same
/// room from colliding.
fn settlement_id(room_id: &RoomId) -> String {
    let suffix: u32 = rand::rng().random();
    format!("game_{room_id}_{suffix:08x}")
}
