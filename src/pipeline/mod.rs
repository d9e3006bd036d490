//! Pipeline entry points for the lineup scraper.
//!
//! - `run_scrape`: Fetch, enrich, download and emit one seasonal lineup
//! - `group_by_weekday`: Bucket and order records for output

pub mod group;
pub mod scrape;

pub use group::{DayGroup, group_by_weekday, record_count};
pub use scrape::{ScrapeOutcome, flatten, run_scrape};
