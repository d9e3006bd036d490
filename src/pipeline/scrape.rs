// src/pipeline/scrape.rs

//! Top-level scrape run.
//!
//! fetch -> parse -> (render fallback) -> enrich -> images -> group -> emit

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Config, LineupRecord, Season, SourceVariant};
use crate::pipeline::group::{DayGroup, group_by_weekday, record_count};
use crate::services::{
    ApiLineupSource, DomLineupSource, DynamicRenderSource, Enricher, EnrichmentReport, Fetcher,
    ImageDownloader, ImageReport, LineupSource, ParsedLineup,
};
use crate::storage::{CsvLayout, LocalStorage, render_csv};
use crate::utils::log::RunLog;

const STATUS_FILE: &str = "_status.txt";
const SUMMARY_FILE: &str = "summary.json";
const RUN_LOG_FILE: &str = "run.log";

/// Records echoed to the run log in verbose runs.
const SAMPLE_ROWS: usize = 3;

/// Result of a completed run.
#[derive(Debug)]
pub struct ScrapeOutcome {
    pub run_dir: PathBuf,
    pub csv_path: PathBuf,
    pub status_path: PathBuf,
    pub run_log_path: PathBuf,
    pub season: Season,
    pub variant: SourceVariant,
    pub groups: Vec<DayGroup>,
    pub used_dynamic: bool,
    /// Annotation raised by the primary fetch (e.g. marker text absent)
    pub fetch_warning: Option<String>,
    pub structure_warnings: Vec<String>,
    pub enrichment: EnrichmentReport,
    pub images: ImageReport,
}

impl ScrapeOutcome {
    pub fn record_count(&self) -> usize {
        record_count(&self.groups)
    }
}

/// Counters written to `summary.json`.
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    generated_at: String,
    season: String,
    variant: SourceVariant,
    records: usize,
    per_day: Vec<DayCount>,
    used_dynamic: bool,
    fetch_warning: Option<&'a str>,
    structure_warnings: &'a [String],
    enrichment: &'a EnrichmentReport,
    images: &'a ImageReport,
}

#[derive(Debug, Serialize)]
struct DayCount {
    weekday: &'static str,
    records: usize,
}

/// Run one scrape and write its artifacts under the dated run directory.
///
/// Fails with [`AppError::LoginOrAccess`] before anything is written when the
/// lineup cannot be retrieved.
pub async fn run_scrape(config: &Config, today: NaiveDate) -> Result<ScrapeOutcome> {
    config.validate()?;

    let mut run_log = RunLog::new(config.logging.verbose);
    let season = config.season(today)?;
    let variant = config.source.variant;
    run_log.header(&format!("Lineup scrape: {} ({})", season, season.code()));

    let fetcher = Fetcher::new(config)?;
    let source: Box<dyn LineupSource + '_> = match variant {
        SourceVariant::Api => Box::new(ApiLineupSource::new(&fetcher, config, season)),
        SourceVariant::Dom => Box::new(DomLineupSource::new(&fetcher, config)),
    };

    // Stage 1: fetch. Any failure here is terminal and leaves no output.
    run_log.info(format!("Fetching lineup via {}", source.name()));
    let raw = match source.fetch().await {
        Ok(raw) => raw,
        Err(e) => {
            run_log.error(format!("Lineup fetch failed: {e}"));
            return Err(AppError::LoginOrAccess(e.to_string()));
        }
    };
    run_log.info(format!("Fetched {} bytes from {}", raw.body.len(), raw.url));
    let fetch_warning = raw.warning.clone();
    if let Some(warning) = &fetch_warning {
        run_log.warn(warning);
    }

    let run_dir = config.run_dir(today);
    let storage = LocalStorage::new(&run_dir);
    storage.ensure_root().await?;
    storage.write_text(source.snapshot_name(), &raw.body).await?;
    run_log.info(format!("Output directory: {}", storage.root().display()));
    run_log.debug(format!("Snapshot saved as {}", source.snapshot_name()));

    // Stage 2: parse, falling back to a rendered page when nothing was found.
    let mut parsed = match source.parse(&raw) {
        Ok(parsed) => parsed,
        Err(AppError::Fetch(e)) => {
            run_log.error(format!("Lineup payload unreadable: {e}"));
            return Err(AppError::LoginOrAccess(e.to_string()));
        }
        Err(e) => {
            run_log.error(format!("Lineup parse failed: {e}"));
            storage.write_text(RUN_LOG_FILE, &run_log.render()).await?;
            return Err(e);
        }
    };
    run_log.info(format!("Parsed {} records ({})", parsed.records.len(), source.name()));
    for warning in &parsed.warnings {
        run_log.warn(warning);
    }
    let mut structure_warnings = std::mem::take(&mut parsed.warnings);

    let mut used_dynamic = false;
    if parsed.is_empty() && config.source.dynamic_fallback && variant == SourceVariant::Dom {
        run_log.info("Static parse found nothing, rendering page in headless browser");
        match render_fallback(config, &storage).await {
            Ok(rendered) if !rendered.is_empty() => {
                run_log.info(format!("Rendered page gave {} records", rendered.records.len()));
                used_dynamic = true;
                structure_warnings.clear();
                parsed = rendered;
            }
            Ok(_) => run_log.warn("Rendered page gave no records either"),
            Err(e) => run_log.warn(format!("Dynamic render failed: {e}")),
        }
    }
    let mut records = parsed.records;
    for record in records.iter().take(SAMPLE_ROWS) {
        run_log.debug(format!(
            "Parsed {} #{} '{}' date='{}' image='{}' link={:?}",
            record.weekday,
            record.ordinal,
            record.title,
            record.date_text,
            record.image_url,
            record.source_link
        ));
    }

    // Stage 3: enrichment
    let mut enricher = Enricher::new(&fetcher, config, config.feed_url(&season))?;
    let enrichment = enricher.enrich(&mut records).await;
    run_log.info(format!(
        "Dates: {} missing, {} from feed, {} from detail pages ({} requests, {} cached), {} still missing",
        enrichment.missing_before,
        enrichment.resolved_by_feed,
        enrichment.resolved_by_detail,
        enrichment.detail_requests,
        enrichment.cache_hits,
        enrichment.still_missing
    ));
    for record in records.iter().filter(|r| r.is_resolved()).take(SAMPLE_ROWS) {
        run_log.debug(format!("Dated '{}' {}", record.title, record.date_text));
    }

    // Stage 4: images
    let images = if config.images.enabled {
        let dir = storage.path(&config.paths.images_dir_name);
        let report = ImageDownloader::new(&fetcher, &config.images)
            .download_all(&mut records, &dir)
            .await?;
        run_log.info(format!(
            "Images: {} saved, {} not saved, {} already present, {} without candidates",
            report.saved, report.not_saved, report.skipped_existing, report.without_candidates
        ));
        report
    } else {
        run_log.info("Image download disabled");
        ImageReport::default()
    };

    // Stage 5: group and emit
    let groups = group_by_weekday(records);
    let csv = render_csv(&groups, CsvLayout::from(variant))?;
    storage.write_bytes(&config.paths.csv_name, &csv).await?;
    run_log.info(format!("CSV written: {}", storage.path(&config.paths.csv_name).display()));

    let outcome = ScrapeOutcome {
        csv_path: storage.path(&config.paths.csv_name),
        status_path: storage.path(STATUS_FILE),
        run_log_path: storage.path(RUN_LOG_FILE),
        run_dir,
        season,
        variant,
        groups,
        used_dynamic,
        fetch_warning,
        structure_warnings,
        enrichment,
        images,
    };

    storage
        .write_text(STATUS_FILE, &format!("{}\n", status_line(&outcome)))
        .await?;
    storage.write_json(SUMMARY_FILE, &summary(&outcome)).await?;

    run_log.summary(
        "Scrape complete",
        &[
            ("Records", outcome.record_count().to_string()),
            ("Days", outcome.groups.len().to_string()),
            ("Images saved", outcome.images.saved.to_string()),
            ("Dates missing", outcome.enrichment.still_missing.to_string()),
            ("Output", outcome.run_dir.display().to_string()),
        ],
    );
    storage.write_text(RUN_LOG_FILE, &run_log.render()).await?;

    Ok(outcome)
}

/// Render the page and parse it; the rendered markup replaces the snapshot.
async fn render_fallback(config: &Config, storage: &LocalStorage) -> Result<ParsedLineup> {
    let render = DynamicRenderSource::new(config);
    let raw = render.fetch().await?;
    let parsed = render.parse(&raw)?;
    if !parsed.is_empty() {
        storage.write_text(render.snapshot_name(), &raw.body).await?;
    }
    Ok(parsed)
}

/// One-line `key=value` run status.
fn status_line(outcome: &ScrapeOutcome) -> String {
    let mut fields = vec![
        format!("entries={}", outcome.record_count()),
        format!("saved_images={}", outcome.images.saved),
        format!("missing_dates={}", outcome.enrichment.still_missing),
        format!("season={}", outcome.season.code()),
        format!("variant={}", variant_name(outcome.variant)),
    ];
    if let Some(warning) = &outcome.fetch_warning {
        fields.push(format!("live_warn={warning}"));
    }
    if outcome.used_dynamic {
        fields.push("used_dynamic=1".to_string());
    }
    if let Some(warning) = outcome.structure_warnings.first() {
        fields.push(format!("structure_warning={warning}"));
    }
    fields.join(" ")
}

fn summary(outcome: &ScrapeOutcome) -> RunSummary<'_> {
    RunSummary {
        generated_at: Local::now().to_rfc3339(),
        season: outcome.season.code(),
        variant: outcome.variant,
        records: outcome.record_count(),
        per_day: outcome
            .groups
            .iter()
            .map(|g| DayCount {
                weekday: g.weekday.label(),
                records: g.records.len(),
            })
            .collect(),
        used_dynamic: outcome.used_dynamic,
        fetch_warning: outcome.fetch_warning.as_deref(),
        structure_warnings: &outcome.structure_warnings,
        enrichment: &outcome.enrichment,
        images: &outcome.images,
    }
}

fn variant_name(variant: SourceVariant) -> &'static str {
    match variant {
        SourceVariant::Api => "api",
        SourceVariant::Dom => "dom",
    }
}

/// Records across all groups, in output order.
pub fn flatten(groups: &[DayGroup]) -> impl Iterator<Item = &LineupRecord> {
    groups.iter().flat_map(|g| g.records.iter())
}
