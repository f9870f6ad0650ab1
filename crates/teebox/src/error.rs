//! Unified error type for the Teebox console.

use teebox_billing::BillingError;
use teebox_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `teebox` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// A billing-level error (room state, fees, settlement).
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// A store-level error (load, subscribe, write conflict).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The occupancy board actor has shut down and can no longer
    /// service commands.
    #[error("occupancy board is closed")]
    BoardClosed,
}
