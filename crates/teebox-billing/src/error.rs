//! Error types for the billing engine.

use teebox_model::{RoomId, RoomStatus};
use teebox_store::StoreError;

/// Errors that can occur during billing operations.
///
/// Every failed operation leaves room state unchanged; nothing here is
/// swallowed or papered over with synthetic data.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// The referenced room id is absent from the store's room list.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// A session start was attempted on a room that isn't available.
    #[error("room {room} is {status}, cannot start a session")]
    RoomUnavailable { room: RoomId, status: RoomStatus },

    /// A checkout was attempted on a room without a valid session
    /// start timestamp. Settling such a room as a zero-length session
    /// would silently write off billable time, so it fails instead.
    #[error("room {0} has no valid session to settle")]
    InvalidSession(RoomId),

    /// The store profile is absent, or its billing settings are
    /// unusable (zero interval would divide by zero).
    #[error("billing configuration missing or invalid")]
    ConfigurationMissing,

    /// A room-count adjustment outside the allowed 1–20 range.
    #[error("room count {0} is out of range (1-20)")]
    RoomCountOutOfRange(u32),

    /// The underlying document store failed. Retrying is the caller's
    /// decision; the engine never retries on its own.
    #[error(transparent)]
    Store(#[from] StoreError),
}
