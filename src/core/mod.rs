//! Core engine for cargo-lockstep operations
//!
//! - **version**: version string validation
//! - **catalog**: which manifests carry which version fragments
//! - **config**: roster configuration (lockstep.toml) parsing and validation
//! - **plan**: replacement tasks and plan fingerprints
//! - **replace**: per-task outcome decisions, literal or structured
//! - **sync**: plan execution with sequential or transactional commits
//! - **error**: error types with contextual help messages

pub mod catalog;
pub mod config;
pub mod error;
pub mod plan;
pub mod replace;
pub mod sync;
pub mod version;
