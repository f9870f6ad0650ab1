//! Per-store billing settings and the profile document that carries
//! them alongside the room list.

use serde::{Deserialize, Serialize};

use crate::Room;

/// Lower bound for a store's configured room count.
pub const MIN_ROOM_COUNT: u32 = 1;
/// Upper bound for a store's configured room count.
pub const MAX_ROOM_COUNT: u32 = 20;

// ---------------------------------------------------------------------------
// BillingConfig
// ---------------------------------------------------------------------------

/// A store's billing settings, saved from the settings screen and read
/// by the engine on every fee computation.
///
/// Fees are a step function of elapsed time: `rate_per_interval` is
/// charged once per *completed* `time_interval`, never pro-rated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingConfig {
    /// Currency minor units charged per completed interval.
    pub rate_per_interval: u64,
    /// Interval length in minutes. Zero is invalid (rejected by the
    /// engine before any division happens).
    pub time_interval: u32,
    /// Target number of rooms, bounded 1–20.
    pub room_count: u32,
}

impl BillingConfig {
    /// The display rate cached on each room:
    /// `round(rate_per_interval * 60 / time_interval)`.
    ///
    /// Returns `None` when `time_interval` is zero — the caller must
    /// reject the configuration rather than divide by zero.
    pub fn hourly_rate(&self) -> Option<u64> {
        if self.time_interval == 0 {
            return None;
        }
        let rate = (self.rate_per_interval as f64 * 60.0 / self.time_interval as f64).round();
        Some(rate as u64)
    }

    /// Whether a requested room count is inside the allowed bounds.
    pub fn room_count_in_range(count: u32) -> bool {
        (MIN_ROOM_COUNT..=MAX_ROOM_COUNT).contains(&count)
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            rate_per_interval: 5_000,
            time_interval: 10,
            room_count: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// StoreProfile
// ---------------------------------------------------------------------------

/// The per-store document: the room array plus the billing settings,
/// flattened so the serialized shape matches the production schema
/// (`rooms`, `ratePerInterval`, `timeInterval`, `roomCount` as sibling
/// fields).
///
/// `version` is a compare-and-swap token: every room-list write names
/// the version it read, and the store rejects the write if the
/// document moved underneath it. Documents that predate the field
/// deserialize at version 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProfile {
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(flatten)]
    pub config: BillingConfig,
    #[serde(default)]
    pub version: u64,
}

impl StoreProfile {
    pub fn new(config: BillingConfig) -> Self {
        Self {
            rooms: Vec::new(),
            config,
            version: 0,
        }
    }

    /// Finds a room by id.
    pub fn room(&self, id: &crate::RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    /// Finds a room by id, mutably.
    pub fn room_mut(&mut self, id: &crate::RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| &r.id == id)
    }
}
