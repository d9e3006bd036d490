// src/services/images.rs

//! Thumbnail acquisition.
//!
//! Candidates are tried in order per record; downloads for different
//! records run concurrently up to the configured worker count.

use std::path::Path;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::Result;
use crate::models::{ImagesConfig, LineupRecord};
use crate::services::Fetcher;
use crate::storage::LocalStorage;
use crate::utils::naming::{url_extension, with_extension};

/// Counters of one download pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageReport {
    pub saved: usize,
    pub not_saved: usize,
    pub skipped_existing: usize,
    pub without_candidates: usize,
}

/// Per-record result.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Saved(String),
    NotSaved,
    Existing,
    NoCandidates,
}

/// Downloads record thumbnails into a directory.
pub struct ImageDownloader<'a> {
    fetcher: &'a Fetcher,
    config: &'a ImagesConfig,
}

impl<'a> ImageDownloader<'a> {
    pub fn new(fetcher: &'a Fetcher, config: &'a ImagesConfig) -> Self {
        Self { fetcher, config }
    }

    /// Download every record's thumbnail into `dir`.
    ///
    /// A saved record's `local_image_filename` is updated to the name actually
    /// written. Failures are counted, never raised.
    pub async fn download_all(&self, records: &mut [LineupRecord], dir: &Path) -> Result<ImageReport> {
        let storage = LocalStorage::new(dir);
        storage.ensure_root().await?;

        let jobs: Vec<(usize, Vec<String>, String)> = records
            .iter()
            .enumerate()
            .map(|(idx, r)| {
                (
                    idx,
                    r.image_candidates.clone(),
                    r.local_image_filename.clone(),
                )
            })
            .collect();

        let workers = self.config.max_workers.max(1);
        let mut results = stream::iter(jobs)
            .map(|(idx, candidates, filename)| {
                let storage = &storage;
                async move { (idx, self.download_one(storage, &candidates, &filename).await) }
            })
            .buffer_unordered(workers);

        let mut report = ImageReport::default();
        while let Some((idx, outcome)) = results.next().await {
            match outcome {
                Outcome::Saved(name) => {
                    report.saved += 1;
                    records[idx].local_image_filename = name;
                }
                Outcome::NotSaved => report.not_saved += 1,
                Outcome::Existing => report.skipped_existing += 1,
                Outcome::NoCandidates => report.without_candidates += 1,
            }
        }

        Ok(report)
    }

    async fn download_one(
        &self,
        storage: &LocalStorage,
        candidates: &[String],
        filename: &str,
    ) -> Outcome {
        if candidates.is_empty() || filename.is_empty() {
            return Outcome::NoCandidates;
        }
        if storage.exists(filename).await {
            return Outcome::Existing;
        }

        for url in candidates {
            if !is_http_url(url) {
                log::debug!("Skipping non-URL image candidate '{}'", url);
                continue;
            }
            let bytes = match self.fetcher.get_image(url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::debug!("Image candidate failed: {}", e);
                    continue;
                }
            };

            let target = self.target_name(filename, url);
            match storage.write_bytes(&target, &bytes).await {
                Ok(()) => return Outcome::Saved(target),
                Err(e) => {
                    log::warn!("Failed to write image {}: {}", target, e);
                    return Outcome::NotSaved;
                }
            }
        }

        Outcome::NotSaved
    }

    /// File name for a downloaded candidate: its own extension unless that is a placeholder.
    fn target_name(&self, filename: &str, url: &str) -> String {
        match url_extension(url) {
            Some(ext) if !self.is_placeholder(&ext) => with_extension(filename, &ext),
            _ => filename.to_string(),
        }
    }

    fn is_placeholder(&self, ext: &str) -> bool {
        self.config
            .placeholder_extensions
            .iter()
            .any(|p| p.eq_ignore_ascii_case(ext))
    }
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
