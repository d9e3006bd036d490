//! Lineup scraper CLI
//!
//! Local execution entry point. Exits 2 when the lineup cannot be accessed
//! and 1 on any other failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lineup::{
    error::Result,
    models::{Config, SourceVariant},
    pipeline::{self, ScrapeOutcome},
};

/// Seasonal anime lineup scraper
#[derive(Parser, Debug)]
#[command(
    name = "lineup",
    version,
    about = "Scrapes the seasonal anime lineup into CSV and thumbnails"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "lineup.toml")]
    config: PathBuf,

    /// Lineup source: api or dom
    #[arg(long)]
    variant: Option<SourceVariant>,

    /// Render the page in a headless browser when static parsing finds nothing
    #[arg(long)]
    dynamic: bool,

    /// Output root (run directories are created beneath it)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Season code override, e.g. 202504
    #[arg(long)]
    season: Option<String>,

    /// Skip the secondary schedule feed
    #[arg(long)]
    skip_feed: bool,

    /// Skip detail page lookups
    #[arg(long)]
    skip_detail: bool,

    /// Do not download thumbnails
    #[arg(long)]
    no_images: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Flags override file and environment settings.
    fn apply(&self, config: &mut Config) {
        if let Some(variant) = self.variant {
            config.source.variant = variant;
        }
        if self.dynamic {
            config.source.dynamic_fallback = true;
        }
        if let Some(dir) = &self.out_dir {
            config.paths.out_root = dir.clone();
        }
        if let Some(season) = &self.season {
            config.source.season = Some(season.clone());
        }
        if self.skip_feed {
            config.enrichment.feed_enabled = false;
        }
        if self.skip_detail {
            config.enrichment.detail_enabled = false;
        }
        if self.no_images {
            config.images.enabled = false;
        }
        if self.verbose {
            config.logging.verbose = true;
        }
    }

    /// Final configuration: file (or defaults when absent), then environment,
    /// then flags. The flag reports whether the file was missing.
    fn load_config(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<(Config, bool)> {
        let missing = !self.config.exists();
        let mut config = if missing {
            Config::default()
        } else {
            Config::load(&self.config)?
        };
        config.apply_env_with(lookup);
        self.apply(&mut config);
        Ok((config, missing))
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn run(config: Config) -> Result<ScrapeOutcome> {
    config.validate()?;

    log::info!(
        "Scraping lineup via {:?} into {}",
        config.source.variant,
        config.paths.out_root.display()
    );

    let today = chrono::Local::now().date_naive();
    pipeline::run_scrape(&config, today).await
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = cli.load_config(|key| std::env::var(key).ok());

    // Logging follows the merged verbose setting, so it starts after loading.
    let verbose = loaded
        .as_ref()
        .map_or(cli.verbose, |(config, _)| config.logging.verbose);
    init_logging(verbose);

    let config = match loaded {
        Ok((config, missing)) => {
            if missing {
                log::warn!(
                    "Config file {} not found. Using defaults.",
                    cli.config.display()
                );
            }
            config
        }
        Err(e) => {
            log::error!("Config load failed from {}: {e}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(outcome) => {
            log::info!(
                "Done: {} records, {} images saved, CSV at {}",
                outcome.record_count(),
                outcome.images.saved,
                outcome.csv_path.display()
            );
            if let Some(warning) = outcome.structure_warnings.first() {
                log::warn!("Page structure may have changed: {warning}");
            }
            ExitCode::SUCCESS
        }
        Err(e) if e.is_access_failure() => {
            log::error!("{e}");
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_verbose_from_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lineup.toml");
        std::fs::write(&path, "[logging]\nverbose = true\n").unwrap();

        let cli = Cli::parse_from(["lineup", "--config", path.to_str().unwrap()]);
        let (config, missing) = cli.load_config(no_env).unwrap();
        assert!(!missing);
        assert!(config.logging.verbose);
    }

    #[test]
    fn test_verbose_from_any_truthy_env_value() {
        let cli = Cli::parse_from(["lineup", "--config", "does-not-exist.toml"]);
        let (config, missing) = cli
            .load_config(|key| (key == "LINEUP_DEBUG").then(|| "true".to_string()))
            .unwrap();
        assert!(missing);
        assert!(config.logging.verbose);
    }

    #[test]
    fn test_flags_override_file_and_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lineup.toml");
        std::fs::write(&path, "[source]\nvariant = \"api\"\n").unwrap();

        let cli = Cli::parse_from([
            "lineup",
            "--config",
            path.to_str().unwrap(),
            "--variant",
            "dom",
            "--out-dir",
            "elsewhere",
            "--skip-detail",
        ]);
        let (config, _) = cli
            .load_config(|key| (key == "LINEUP_OUT_DIR").then(|| "from-env".to_string()))
            .unwrap();
        assert_eq!(config.source.variant, SourceVariant::Dom);
        assert_eq!(config.paths.out_root, PathBuf::from("elsewhere"));
        assert!(!config.enrichment.detail_enabled);
        assert!(!config.logging.verbose);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lineup.toml");
        std::fs::write(&path, "[source\n").unwrap();

        let cli = Cli::parse_from(["lineup", "--config", path.to_str().unwrap()]);
        assert!(cli.load_config(no_env).is_err());
    }
}
