//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{LineupSelectors, Season};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Where the lineup comes from
    #[serde(default)]
    pub source: SourceConfig,

    /// DOM selectors and marker tokens
    #[serde(default)]
    pub selectors: LineupSelectors,

    /// Broadcast date enrichment
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Thumbnail download
    #[serde(default)]
    pub images: ImagesConfig,

    /// Output layout
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply `LINEUP_*` environment toggles.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply environment toggles read through `lookup`.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let enabled = |key: &str| lookup(key).is_some_and(|v| is_truthy(&v));

        if enabled("LINEUP_SKIP_DETAIL") {
            self.enrichment.detail_enabled = false;
        }
        if enabled("LINEUP_SKIP_FEED") {
            self.enrichment.feed_enabled = false;
        }
        if enabled("LINEUP_DEBUG") {
            self.logging.verbose = true;
        }
        if enabled("LINEUP_DYNAMIC") {
            self.source.dynamic_fallback = true;
        }
        if let Some(dir) = lookup("LINEUP_OUT_DIR").filter(|d| !d.trim().is_empty()) {
            self.paths.out_root = PathBuf::from(dir.trim());
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.images.max_workers == 0 {
            return Err(AppError::validation("images.max_workers must be > 0"));
        }
        if self.source.render_timeout_secs == 0 {
            return Err(AppError::validation("source.render_timeout_secs must be > 0"));
        }
        for (name, value) in [
            ("source.page_url", &self.source.page_url),
            ("source.api_url", &self.source.api_url),
            ("source.feed_base_url", &self.source.feed_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::validation(format!("{name} is not a valid URL: {e}")))?;
        }
        if let Some(code) = &self.source.season {
            Season::parse_code(code)?;
        }
        if self.paths.csv_name.trim().is_empty() {
            return Err(AppError::validation("paths.csv_name is empty"));
        }
        if self.selectors.image_attrs.is_empty() {
            return Err(AppError::validation("selectors.image_attrs is empty"));
        }
        Ok(())
    }

    /// Season to scrape: the configured override, or the one containing `today`.
    pub fn season(&self, today: NaiveDate) -> Result<Season> {
        match &self.source.season {
            Some(code) => Season::parse_code(code),
            None => Ok(Season::from_date(today)),
        }
    }

    /// Secondary feed URL for a season.
    pub fn feed_url(&self, season: &Season) -> String {
        format!(
            "{}/new_tv_adddata_{}.json",
            self.source.feed_base_url.trim_end_matches('/'),
            season.slug()
        )
    }

    /// Output directory for a run on `today`.
    pub fn run_dir(&self, today: NaiveDate) -> PathBuf {
        self.paths
            .out_root
            .join(today.format("%Y%m%d").to_string())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for every request
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Accept header for image requests
    #[serde(default = "defaults::image_accept")]
    pub image_accept: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            image_accept: defaults::image_accept(),
        }
    }
}

/// Which parser drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceVariant {
    /// Lineup API JSON, day-grouped CSV
    #[default]
    Api,
    /// Lineup page markup, flat CSV
    Dom,
}

impl std::str::FromStr for SourceVariant {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "dom" => Ok(Self::Dom),
            other => Err(AppError::config(format!(
                "Unknown source variant '{other}' (expected api or dom)"
            ))),
        }
    }
}

/// Lineup source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub variant: SourceVariant,

    /// Lineup page, also sent as referer
    #[serde(default = "defaults::page_url")]
    pub page_url: String,

    /// Lineup API endpoint
    #[serde(default = "defaults::api_url")]
    pub api_url: String,

    /// Directory holding the secondary schedule feeds
    #[serde(default = "defaults::feed_base_url")]
    pub feed_base_url: String,

    /// Season code override (`YYYYQQ`); derived from the run date when unset
    #[serde(default)]
    pub season: Option<String>,

    /// Render the page in a headless browser when static parsing finds nothing
    #[serde(default)]
    pub dynamic_fallback: bool,

    /// Headless browser program
    #[serde(default = "defaults::browser")]
    pub browser: String,

    /// Virtual time the browser is given to run page scripts
    #[serde(default = "defaults::render_budget")]
    pub render_budget_ms: u64,

    /// Hard limit on the browser process
    #[serde(default = "defaults::render_timeout")]
    pub render_timeout_secs: u64,

    /// Text expected in a well-formed lineup page
    #[serde(default = "defaults::expected_marker")]
    pub expected_marker: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            variant: SourceVariant::default(),
            page_url: defaults::page_url(),
            api_url: defaults::api_url(),
            feed_base_url: defaults::feed_base_url(),
            season: None,
            dynamic_fallback: false,
            browser: defaults::browser(),
            render_budget_ms: defaults::render_budget(),
            render_timeout_secs: defaults::render_timeout(),
            expected_marker: defaults::expected_marker(),
        }
    }
}

/// Broadcast date enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "defaults::enabled")]
    pub feed_enabled: bool,

    #[serde(default = "defaults::enabled")]
    pub detail_enabled: bool,

    /// Pause between uncached detail-page requests
    #[serde(default = "defaults::detail_cooldown")]
    pub detail_cooldown_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            feed_enabled: true,
            detail_enabled: true,
            detail_cooldown_ms: defaults::detail_cooldown(),
        }
    }
}

/// Thumbnail download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Maximum concurrent downloads
    #[serde(default = "defaults::max_workers")]
    pub max_workers: usize,

    /// Extension used when a URL carries none
    #[serde(default = "defaults::default_extension")]
    pub default_extension: String,

    /// URL extensions that never name a real image type
    #[serde(default = "defaults::placeholder_extensions")]
    pub placeholder_extensions: Vec<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_workers: defaults::max_workers(),
            default_extension: defaults::default_extension(),
            placeholder_extensions: defaults::placeholder_extensions(),
        }
    }
}

/// Output layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root under which dated run directories are created
    #[serde(default = "defaults::out_root")]
    pub out_root: PathBuf,

    #[serde(default = "defaults::csv_name")]
    pub csv_name: String,

    #[serde(default = "defaults::images_dir_name")]
    pub images_dir_name: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            out_root: defaults::out_root(),
            csv_name: defaults::csv_name(),
            images_dir_name: defaults::images_dir_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Record debug lines in the run log
    #[serde(default)]
    pub verbose: bool,
}

mod defaults {
    use std::path::PathBuf;

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        15
    }
    pub fn image_accept() -> String {
        "image/avif,image/webp,image/apng,image/*,*/*;q=0.8".into()
    }

    // Source defaults
    pub fn page_url() -> String {
        "https://animestore.docomo.ne.jp/animestore/CF/fall".into()
    }
    pub fn api_url() -> String {
        "https://animestore.docomo.ne.jp/animestore/rest/WS000118".into()
    }
    pub fn feed_base_url() -> String {
        "https://animestore.docomo.ne.jp/js/cms".into()
    }
    pub fn browser() -> String {
        "chromium".into()
    }
    pub fn render_budget() -> u64 {
        8000
    }
    pub fn render_timeout() -> u64 {
        60
    }
    pub fn expected_marker() -> String {
        "weekText".into()
    }

    // Enrichment defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn detail_cooldown() -> u64 {
        300
    }

    // Image defaults
    pub fn max_workers() -> usize {
        6
    }
    pub fn default_extension() -> String {
        ".png".into()
    }
    pub fn placeholder_extensions() -> Vec<String> {
        vec![".php".into()]
    }

    // Path defaults
    pub fn out_root() -> PathBuf {
        PathBuf::from("OUT")
    }
    pub fn csv_name() -> String {
        "anime_list.csv".into()
    }
    pub fn images_dir_name() -> String {
        "images".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.images.max_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_season_override() {
        let mut config = Config::default();
        config.source.season = Some("2025Q4".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [source]
            variant = "dom"

            [images]
            max_workers = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.source.variant, SourceVariant::Dom);
        assert_eq!(config.images.max_workers, 2);
        assert_eq!(config.images.default_extension, ".png");
        assert_eq!(config.selectors.container, "#newContents");
        assert!(config.enrichment.detail_enabled);
    }

    #[test]
    fn env_toggles_apply() {
        let env: HashMap<&str, &str> = [
            ("LINEUP_SKIP_DETAIL", "1"),
            ("LINEUP_SKIP_FEED", "0"),
            ("LINEUP_DEBUG", "true"),
            ("LINEUP_OUT_DIR", "/tmp/lineup"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_with(|k| env.get(k).map(|v| v.to_string()));

        assert!(!config.enrichment.detail_enabled);
        assert!(config.enrichment.feed_enabled);
        assert!(config.logging.verbose);
        assert!(!config.source.dynamic_fallback);
        assert_eq!(config.paths.out_root, PathBuf::from("/tmp/lineup"));
    }

    #[test]
    fn season_override_and_feed_url() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 19).unwrap();
        let mut config = Config::default();
        assert_eq!(config.season(today).unwrap().code(), "202504");

        config.source.season = Some("202601".to_string());
        let season = config.season(today).unwrap();
        assert_eq!(
            config.feed_url(&season),
            "https://animestore.docomo.ne.jp/js/cms/new_tv_adddata_winter.json"
        );
        assert_eq!(config.run_dir(today), PathBuf::from("OUT/20251019"));
    }

    #[test]
    fn variant_from_str() {
        assert_eq!("DOM".parse::<SourceVariant>().unwrap(), SourceVariant::Dom);
        assert!("html".parse::<SourceVariant>().is_err());
    }
}
