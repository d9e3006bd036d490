//! Output storage for scrape runs.
//!
//! Everything a run produces lives under one dated directory:
//!
//! ```text
//! {out_root}/
//! └── YYYYMMDD/
//!     ├── anime_list.csv
//!     ├── images/
//!     ├── _status.txt
//!     ├── summary.json
//!     └── run.log
//! ```

pub mod export;
pub mod local;

// Re-export for convenience
pub use export::{CsvLayout, render_csv};
pub use local::LocalStorage;
