//! Persistence abstraction for the Teebox billing console.
//!
//! The billing engine never talks to a database driver directly; it
//! goes through the [`DocumentStore`] trait, which captures the exact
//! contract the console needs from its document database:
//!
//! - read a store profile by `users_<CC>/<email>`
//! - overwrite the room array (guarded by a version token)
//! - overwrite the billing settings
//! - settle: append one ledger record *and* reset the room, as a
//!   single logical transaction
//! - subscribe to live profile updates
//!
//! [`MemoryStore`] is the in-process implementation used by tests and
//! demos.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use std::future::Future;

use teebox_model::{BillingConfig, CountryCode, GameRecord, Room, StoreKey, StoreProfile};
use tokio::sync::watch;

/// The document-database contract the billing engine runs against.
///
/// All writes that replace the room array take the profile version the
/// caller read and fail with [`StoreError::Conflict`] if the document
/// has moved since: two operators racing on the same store lose the
/// write instead of silently clobbering each other.
///
/// # Trait bounds
///
/// `Send + Sync + 'static`, with `Send` futures, so a store can be
/// handed to a spawned board task. Implementations write plain
/// `async fn`s.
pub trait DocumentStore: Send + Sync + 'static {
    /// Fetches a store profile, or `None` if no document exists for
    /// this key.
    fn load_profile(
        &self,
        key: &StoreKey,
    ) -> impl Future<Output = Result<Option<StoreProfile>, StoreError>> + Send;

    /// Overwrites the room array.
    ///
    /// `expected_version` must match the stored document's version;
    /// on success the document's version is bumped and returned.
    fn write_rooms(
        &self,
        key: &StoreKey,
        rooms: Vec<Room>,
        expected_version: u64,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Overwrites the billing settings, leaving the room array as is.
    fn write_config(
        &self,
        key: &StoreKey,
        config: BillingConfig,
        expected_version: u64,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Commits a settlement: appends `record` to the country-scoped
    /// ledger and overwrites the room array, atomically.
    ///
    /// A crash can never leave a billed session without a ledger entry
    /// or a ledger entry for a room still marked occupied. Either the
    /// whole settle happened or none of it did.
    fn settle(
        &self,
        key: &StoreKey,
        rooms: Vec<Room>,
        record: GameRecord,
        expected_version: u64,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Subscribes to live updates of a store profile.
    ///
    /// The receiver always holds the latest full document; observers
    /// must replace their local view on each change, not merge into it.
    fn subscribe(
        &self,
        key: &StoreKey,
    ) -> impl Future<Output = Result<watch::Receiver<Option<StoreProfile>>, StoreError>> + Send;

    /// Reads the settlement ledger for a country partition, in append
    /// order.
    fn settlements(
        &self,
        country: &CountryCode,
    ) -> impl Future<Output = Result<Vec<GameRecord>, StoreError>> + Send;
}
