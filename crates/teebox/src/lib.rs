//! # Teebox
//!
//! Admin console engine for screen-golf stores: a live occupancy board,
//! interval-based billing, and an append-only settlement ledger, backed
//! by a pluggable document store.
//!
//! Each store runs one [board](spawn_board): a Tokio task that owns the
//! room view, refreshes elapsed time and fees once per second, and
//! applies operator commands (start a session, check out, resize the
//! room list, change rates) through the billing engine.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use teebox::{spawn_board, CountryCode, MemoryStore, RefreshConfig, StoreKey};
//!
//! # async fn run() -> Result<(), teebox::ConsoleError> {
//! let store = MemoryStore::new();
//! let key = StoreKey::new(CountryCode::normalize("KR"), "pro@links.kr");
//! let board = spawn_board(store, key, RefreshConfig::one_second()).await?;
//!
//! let room = board.start_session(teebox::RoomId::numbered(1)).await?;
//! // ... later ...
//! let record = board.checkout(room.id).await?;
//! println!("fee: {}", record.total_fee);
//! # Ok(())
//! # }
//! ```

mod board;
mod error;

pub use board::{spawn_board, BoardHandle, BoardSnapshot, RoomView};
pub use error::ConsoleError;

pub use teebox_billing::{fee, BillingEngine, BillingError, ElapsedClock};
pub use teebox_model::{
    BillingConfig, CountryCode, GameRecord, Room, RoomId, RoomStatus, StoreId, StoreKey,
    StoreProfile, MAX_ROOM_COUNT, MIN_ROOM_COUNT,
};
pub use teebox_store::{DocumentStore, MemoryStore, StoreError};
pub use teebox_tick::{RefreshConfig, RefreshScheduler};

/// Initializes tracing from `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
