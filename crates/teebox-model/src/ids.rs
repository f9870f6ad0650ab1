//! Identity types: who a store is, which room, which country partition.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomId
// ---------------------------------------------------------------------------

/// A room identifier, stable within one store.
///
/// Rooms synthesized by a room-count adjustment are numbered
/// (`room-1`, `room-2`, ...), but the id is an opaque string as far as
/// the engine is concerned — only equality matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps an existing id as read from a store document.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id used for a synthesized room with the given ordinal.
    pub fn numbered(room_number: u32) -> Self {
        Self(format!("room-{room_number}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// CountryCode
// ---------------------------------------------------------------------------

/// A normalized two-letter country code, the partition key for both
/// the profile collection (`users_<CC>`) and the settlement ledger
/// (`settlements_<CC>`).
///
/// Normalization accepts ISO alpha-2 codes in any case and a handful
/// of spelled-out country names; anything unrecognized falls back to
/// `KR`, matching how the production console partitions unknown input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    /// Normalizes free-form country input to a two-letter code.
    pub fn normalize(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Self(trimmed.to_ascii_uppercase());
        }
        let code = match trimmed.to_ascii_uppercase().as_str() {
            "KOREA" | "SOUTH KOREA" | "REPUBLIC OF KOREA" => "KR",
            "UNITED STATES" | "USA" => "US",
            "JAPAN" => "JP",
            "CHINA" => "CN",
            "UNITED KINGDOM" | "UK" => "GB",
            _ => "KR",
        };
        Self(code.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CountryCode {
    fn default() -> Self {
        Self("KR".to_string())
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// StoreId
// ---------------------------------------------------------------------------

/// A store identifier derived from the manager's email address.
///
/// `@` and `.` are replaced with `_` so the id is safe to use as a
/// document id or path segment (`pro@links.kr` → `pro_links_kr`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(String);

impl StoreId {
    pub fn from_email(email: &str) -> Self {
        Self(email.replace(['@', '.'], "_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// StoreKey
// ---------------------------------------------------------------------------

/// Full addressing for one store's documents: country partition plus
/// the manager email the profile document is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub country: CountryCode,
    pub email: String,
}

impl StoreKey {
    pub fn new(country: CountryCode, email: impl Into<String>) -> Self {
        Self {
            country,
            email: email.into(),
        }
    }

    /// The profile collection this store's document lives in.
    pub fn users_collection(&self) -> String {
        format!("users_{}", self.country)
    }

    /// The settlement ledger collection for this store's country.
    pub fn settlements_collection(&self) -> String {
        format!("settlements_{}", self.country)
    }

    pub fn store_id(&self) -> StoreId {
        StoreId::from_email(&self.email)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.users_collection(), self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        // `#[serde(transparent)]` means RoomId("room-1") → "room-1",
        // not {"0":"room-1"} — documents store the bare string.
        let json = serde_json::to_string(&RoomId::numbered(1)).unwrap();
        assert_eq!(json, "\"room-1\"");
    }

    #[test]
    fn test_room_id_numbered() {
        assert_eq!(RoomId::numbered(7).as_str(), "room-7");
    }

    #[test]
    fn test_country_code_passes_through_alpha2() {
        assert_eq!(CountryCode::normalize("us").as_str(), "US");
        assert_eq!(CountryCode::normalize("JP").as_str(), "JP");
    }

    #[test]
    fn test_country_code_maps_known_names() {
        assert_eq!(CountryCode::normalize("South Korea").as_str(), "KR");
        assert_eq!(CountryCode::normalize("united states").as_str(), "US");
        assert_eq!(CountryCode::normalize("UK").as_str(), "GB");
    }

    #[test]
    fn test_country_code_defaults_to_kr() {
        assert_eq!(CountryCode::normalize("").as_str(), "KR");
        assert_eq!(CountryCode::normalize("Atlantis").as_str(), "KR");
        assert_eq!(CountryCode::default().as_str(), "KR");
    }

    #[test]
    fn test_store_id_from_email() {
        let id = StoreId::from_email("pro@links.co.kr");
        assert_eq!(id.as_str(), "pro_links_co_kr");
    }

    #[test]
    fn test_store_key_collections() {
        let key = StoreKey::new(CountryCode::normalize("KR"), "pro@links.kr");
        assert_eq!(key.users_collection(), "users_KR");
        assert_eq!(key.settlements_collection(), "settlements_KR");
        assert_eq!(key.store_id().as_str(), "pro_links_kr");
    }
}
