//! Shared types and models for the Entrepot Maritime platform
//!
//! This crate contains the domain types shared between the backend and the
//! reporting/UI layers, plus the pure ledger computations (order totals,
//! FIFO consumption planning, alert classification, status machines).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
