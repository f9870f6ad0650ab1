//! Document model for the Teebox billing console.
//!
//! Every type in this crate is a persisted shape — it gets serialized,
//! written to a store document, and read back on the other side. Field
//! names follow the camelCase schema of the production documents, so a
//! `Room` here round-trips byte-for-byte against what the console's
//! store collections already hold.
//!
//! # Key types
//!
//! - [`RoomId`], [`StoreId`], [`CountryCode`], [`StoreKey`] — identity
//! - [`Room`], [`RoomStatus`] — one screen-golf room and its state
//! - [`BillingConfig`], [`StoreProfile`] — per-store settings document
//! - [`GameRecord`] — one immutable settlement ledger entry

mod ids;
mod profile;
mod record;
mod room;

pub use ids::{CountryCode, RoomId, StoreId, StoreKey};
pub use profile::{BillingConfig, StoreProfile, MAX_ROOM_COUNT, MIN_ROOM_COUNT};
pub use record::GameRecord;
pub use room::{Room, RoomStatus};
