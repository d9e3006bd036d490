// src/services/source.rs

//! Lineup source abstraction.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::LineupRecord;

/// Raw payload returned by a source.
#[derive(Debug, Clone)]
pub struct RawLineup {
    /// URL the payload came from
    pub url: String,

    pub body: String,

    /// Non-fatal annotation raised while fetching
    pub warning: Option<String>,
}

impl RawLineup {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            warning: None,
        }
    }
}

/// Records parsed from one payload, plus structure warnings.
#[derive(Debug, Default)]
pub struct ParsedLineup {
    pub records: Vec<LineupRecord>,
    pub warnings: Vec<String>,
}

impl ParsedLineup {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A place the seasonal lineup can be read from.
#[async_trait]
pub trait LineupSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// File name of the raw payload snapshot.
    fn snapshot_name(&self) -> &'static str;

    /// Retrieve the raw payload.
    async fn fetch(&self) -> Result<RawLineup>;

    /// Turn a payload into records.
    fn parse(&self, raw: &RawLineup) -> Result<ParsedLineup>;
}
