//! The `Room` document shape and its occupancy state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RoomId;

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// Occupancy state of a room.
///
/// The billing engine only drives two transitions:
///
/// ```text
/// available --start--> occupied --checkout--> available
/// ```
///
/// `Maintenance` appears in documents (set manually by operators) but
/// the engine never transitions into or out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
}

impl RoomStatus {
    /// Returns `true` if a new session may start in this room.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    /// Returns `true` if a session is currently billed in this room.
    pub fn is_occupied(&self) -> bool {
        matches!(self, Self::Occupied)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Occupied => write!(f, "occupied"),
            Self::Maintenance => write!(f, "maintenance"),
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One screen-golf room as stored in the store profile document.
///
/// Invariant: `game_start_time` is `Some` if and only if
/// `status == Occupied`. The engine enforces this on every transition;
/// [`Room::session_is_consistent`] checks it for documents read back
/// from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// 1-based ordinal; rooms are trimmed from the highest number on
    /// a count reduction.
    pub room_number: u32,
    pub status: RoomStatus,
    /// Cached display rate, re-stamped whenever billing settings
    /// change. Never used for fee computation.
    pub hourly_rate: u64,
    /// Set exactly once when a session starts; cleared on checkout.
    /// Absent from the serialized document when no session is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Room {
    /// Builds a fresh, available room for the given ordinal — the
    /// shape synthesized when a store's room count grows.
    pub fn numbered(room_number: u32, hourly_rate: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: RoomId::numbered(room_number),
            name: format!("Room {room_number}"),
            room_number,
            status: RoomStatus::Available,
            hourly_rate,
            game_start_time: None,
            created_at: Some(created_at),
        }
    }

    /// Marks the room occupied with the session start captured once.
    /// The caller must have verified the room was available.
    pub fn occupy(&mut self, start: DateTime<Utc>) {
        self.status = RoomStatus::Occupied;
        self.game_start_time = Some(start);
    }

    /// Clears the active session and returns the room to available.
    pub fn release(&mut self) {
        self.status = RoomStatus::Available;
        self.game_start_time = None;
    }

    /// Checks the occupancy invariant: occupied ⇔ start time present.
    pub fn session_is_consistent(&self) -> bool {
        self.status.is_occupied() == self.game_start_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_status_serializes_lowercase() {
        // Documents store the status as a bare lowercase string.
        assert_eq!(serde_json::to_string(&RoomStatus::Available).unwrap(), "\"available\"");
        assert_eq!(serde_json::to_string(&RoomStatus::Occupied).unwrap(), "\"occupied\"");
        assert_eq!(serde_json::to_string(&RoomStatus::Maintenance).unwrap(), "\"maintenance\"");
    }

    #[test]
    fn test_room_document_uses_camel_case_fields() {
        let room = Room::numbered(3, 30_000, t0());
        let json: serde_json::Value = serde_json::to_value(&room).unwrap();

        assert_eq!(json["id"], "room-3");
        assert_eq!(json["name"], "Room 3");
        assert_eq!(json["roomNumber"], 3);
        assert_eq!(json["status"], "available");
        assert_eq!(json["hourlyRate"], 30_000);
        // No active session — the field is absent, not null.
        assert!(json.get("gameStartTime").is_none());
    }

    #[test]
    fn test_room_without_start_time_deserializes() {
        // Documents written before a session ever ran have no
        // gameStartTime key at all.
        let json = r#"{
            "id": "room-1", "name": "Room 1", "roomNumber": 1,
            "status": "available", "hourlyRate": 30000
        }"#;
        let room: Room = serde_json::from_str(json).unwrap();
        assert!(room.game_start_time.is_none());
        assert!(room.session_is_consistent());
    }

    #[test]
    fn test_occupy_and_release_keep_invariant() {
        let mut room = Room::numbered(1, 30_000, t0());
        assert!(room.session_is_consistent());

        room.occupy(t0());
        assert_eq!(room.status, RoomStatus::Occupied);
        assert_eq!(room.game_start_time, Some(t0()));
        assert!(room.session_is_consistent());

        room.release();
        assert_eq!(room.status, RoomStatus::Available);
        assert!(room.game_start_time.is_none());
        assert!(room.session_is_consistent());
    }

    #[test]
    fn test_inconsistent_session_detected() {
        let mut room = Room::numbered(1, 30_000, t0());
        room.status = RoomStatus::Occupied; // start time never stamped
        assert!(!room.session_is_consistent());
    }
}
