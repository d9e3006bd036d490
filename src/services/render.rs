// src/services/render.rs

//! Headless browser rendering of the lineup page.
//!
//! Used only when the static markup parses to nothing. The browser is run
//! with `--dump-dom`, so the rendered document arrives on stdout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::dom::{marker_warning, parse_lineup_page};
use crate::services::source::{LineupSource, ParsedLineup, RawLineup};

/// Renders the lineup page in a headless Chromium-compatible browser.
pub struct DynamicRenderSource<'a> {
    config: &'a Config,
}

impl<'a> DynamicRenderSource<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Browser arguments for a single DOM dump.
    fn args(&self) -> Vec<String> {
        let source = &self.config.source;
        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            format!("--user-agent={}", self.config.http.user_agent),
            format!("--virtual-time-budget={}", source.render_budget_ms),
            "--dump-dom".to_string(),
            source.page_url.clone(),
        ]
    }
}

#[async_trait]
impl LineupSource for DynamicRenderSource<'_> {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    fn snapshot_name(&self) -> &'static str {
        "_live.html"
    }

    async fn fetch(&self) -> Result<RawLineup> {
        let source = &self.config.source;
        let mut cmd = Command::new(&source.browser);
        cmd.args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let limit = Duration::from_secs(source.render_timeout_secs);
        let output = tokio::time::timeout(limit, cmd.output())
            .await
            .map_err(|_| {
                AppError::render(format!(
                    "{} did not finish within {}s",
                    source.browser, source.render_timeout_secs
                ))
            })?
            .map_err(|e| AppError::render(format!("failed to spawn {}: {}", source.browser, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::render(format!(
                "{} exited with {}: {}",
                source.browser,
                output.status,
                stderr.trim()
            )));
        }

        let html = String::from_utf8_lossy(&output.stdout).into_owned();
        if html.trim().is_empty() {
            return Err(AppError::render("browser returned an empty document"));
        }

        let item_marker = &self.config.selectors.item;
        if !contains_selector(&html, item_marker) {
            log::debug!("Rendered page has no '{}' yet", item_marker);
        }

        let mut raw = RawLineup::new(source.page_url.as_str(), html);
        raw.warning = marker_warning(&raw.body, &source.expected_marker);
        Ok(raw)
    }

    fn parse(&self, raw: &RawLineup) -> Result<ParsedLineup> {
        parse_lineup_page(raw, self.config)
    }
}

/// Best-effort presence check for a selector in rendered markup.
fn contains_selector(html: &str, selector: &str) -> bool {
    match scraper::Selector::parse(selector) {
        Ok(sel) => scraper::Html::parse_document(html)
            .select(&sel)
            .next()
            .is_some(),
        Err(_) => false,
    }
}
