//! The settlement / game record: one immutable ledger entry per
//! completed room occupancy.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::{Room, StoreId};

/// An immutable record of one finished room occupancy.
///
/// Written exactly once at checkout into the country-scoped ledger
/// collection, then never updated or deleted. The calendar fields are
/// denormalized from the start time so the revenue dashboard can
/// aggregate by weekday/hour/month without re-parsing timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Ledger document id: `game_<roomId>_<suffix>`. The suffix is
    /// random, not wall-clock based, so rapid successive settlements
    /// of the same room can't collide.
    pub id: String,
    pub room_id: crate::RoomId,
    pub room_name: String,
    pub store_id: StoreId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Whole minutes of usage, floored.
    pub usage_minutes: u32,
    /// Usage in hours, rounded to two decimals.
    pub usage_hours: f64,
    pub total_fee: u64,
    /// English weekday name of the start time ("Monday", ...).
    pub day_of_week: String,
    pub hour_of_day: u32,
    pub month: u32,
    pub year: i32,
    pub is_weekend: bool,
    pub created_at: DateTime<Utc>,
}

impl GameRecord {
    /// Builds the record for a settled session.
    ///
    /// `total_fee` must be the step-function fee already computed for
    /// `end_time`; this constructor only derives the usage and
    /// calendar projections.
    pub fn settle(
        id: String,
        room: &Room,
        store_id: StoreId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        total_fee: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        let usage_ms = (end_time - start_time).num_milliseconds().max(0);
        let usage_minutes = (usage_ms / 60_000) as u32;
        let usage_hours = (usage_minutes as f64 / 60.0 * 100.0).round() / 100.0;

        let weekday = start_time.weekday();
        Self {
            id,
            room_id: room.id.clone(),
            room_name: room.name.clone(),
            store_id,
            start_time,
            end_time,
            usage_minutes,
            usage_hours,
            total_fee,
            day_of_week: start_time.format("%A").to_string(),
            hour_of_day: start_time.hour(),
            month: start_time.month(),
            year: start_time.year(),
            is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
            created_at,
        }
    }
}
