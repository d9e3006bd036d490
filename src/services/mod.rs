//! Service layer for the lineup scraper.
//!
//! This module contains the business logic for:
//! - HTTP access (`Fetcher`)
//! - Lineup sources: API JSON, page DOM and headless render (`LineupSource`)
//! - Broadcast date enrichment (`Enricher`)
//! - Thumbnail download (`ImageDownloader`)

mod api;
pub mod dom;
mod enrich;
mod fetcher;
mod images;
mod render;
mod source;

pub use api::{ApiLineupSource, parse_api};
pub use dom::{DomLineupSource, parse_dom};
pub use enrich::{
    DetailCache, Enricher, EnrichmentReport, apply_feed_index, build_feed_index, parse_detail_date,
};
pub use fetcher::Fetcher;
pub use images::{ImageDownloader, ImageReport};
pub use render::DynamicRenderSource;
pub use source::{LineupSource, ParsedLineup, RawLineup};
