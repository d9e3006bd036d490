// src/models/mod.rs

//! Domain models for the lineup scraper.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod payload;
mod record;
mod season;
mod selectors;

// Re-export all public types
pub use config::{
    Config, EnrichmentConfig, HttpConfig, ImagesConfig, LoggingConfig, PathsConfig, SourceConfig,
    SourceVariant,
};
pub use payload::{FeedItem, LineupData, LineupResponse, WorkEntry, WorkInfo};
pub use record::{BroadcastDate, LineupRecord, Weekday};
pub use season::Season;
pub use selectors::LineupSelectors;
