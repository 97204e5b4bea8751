//! Database models for the Entrepot Maritime platform
//!
//! Re-exports the domain models from the shared crate

pub use shared::models::*;
