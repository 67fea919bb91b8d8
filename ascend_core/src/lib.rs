#![forbid(unsafe_code)]

//! Core domain model and business logic for the Ascend progression tracker.
//!
//! This crate provides:
//! - Domain types (categories, movements, waves, workout entries)
//! - The static progression catalog
//! - Durable level and history stores over a key-value storage seam
//! - The session engine state machine
//! - The recommendation requester and the hold timer

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod levels;
pub mod history;
pub mod session;
pub mod recommend;
pub mod timer;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, default_catalog, Catalog};
pub use config::{Config, ProgressionConfig};
pub use store::{FileStore, KeyValue, MemoryStore};
pub use levels::LevelStore;
pub use history::{HistoryStore, HISTORY_CAP};
pub use session::{Direction, Effect, FinishOutcome, SessionEngine};
pub use recommend::{build_request, request_recommendations, CommandBackend};
pub use timer::{Timer, TimerEvent};
