//! Room occupancy billing for the Teebox console.
//!
//! The engine owns the room state machine (`available → occupied →
//! available`) and computes fees deterministically from wall-clock
//! time and the store's rate schedule. Billing is a step function:
//! `rate_per_interval` is charged once per *completed* interval and
//! partial intervals are never billed.
//!
//! # Key types
//!
//! - [`BillingEngine`] — persistence-backed session operations
//! - [`fee`] — the pure fee/elapsed-time computations
//! - [`BillingError`] — everything that can go wrong

mod engine;
mod error;
pub mod fee;

pub use engine::BillingEngine;
pub use error::BillingError;
pub use fee::ElapsedClock;
