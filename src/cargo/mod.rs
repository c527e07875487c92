//! Cargo workspace discovery
//!
//! - **metadata**: list workspace members using cargo_metadata

pub mod metadata;
