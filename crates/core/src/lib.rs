//! `tribute-core`: domain primitives for scheduled maintenance.
//!
//! This crate contains **pure domain** types (no I/O): task identities,
//! execution window keys, content status and deployment classification.

pub mod content;
pub mod environment;
pub mod error;
pub mod outcome;
pub mod run_key;
pub mod task;

pub use content::ContentStatus;
pub use environment::ProductionGate;
pub use error::DomainError;
pub use outcome::CleanupOutcome;
pub use run_key::RunKey;
pub use task::{Frequency, TaskCode};
