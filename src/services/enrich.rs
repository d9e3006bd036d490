// src/services/enrich.rs

//! Broadcast date enrichment.
//!
//! Records the primary source left undated are filled from, in order:
//! 1. the season's secondary schedule feed (fetched once per run)
//! 2. each title's detail page (cached per link, throttled)
//!
//! Every failure leaves the affected record undated.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{BroadcastDate, Config, FeedItem, LineupRecord};
use crate::services::Fetcher;
use crate::utils::{extract_work_id, resolve};

static DETAIL_DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}月\d{1,2}日?～?").unwrap());

/// Counters of one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    pub missing_before: usize,
    pub resolved_by_feed: usize,
    pub resolved_by_detail: usize,
    pub detail_requests: usize,
    pub cache_hits: usize,
    pub still_missing: usize,
    /// Whether the feed was fetched and decoded
    pub feed_available: bool,
}

/// Detail-page results for one run, misses included.
#[derive(Debug, Default)]
pub struct DetailCache {
    entries: HashMap<String, Option<(BroadcastDate, String)>>,
}

impl DetailCache {
    pub fn get(&self, link: &str) -> Option<&Option<(BroadcastDate, String)>> {
        self.entries.get(link)
    }

    pub fn insert(&mut self, link: String, value: Option<(BroadcastDate, String)>) {
        self.entries.insert(link, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fills missing broadcast dates from secondary sources.
pub struct Enricher<'a> {
    fetcher: &'a Fetcher,
    config: &'a Config,
    feed_url: String,
    detail_selector: Selector,
    /// Feed index, fetched on first use; `None` until then
    feed_index: Option<HashMap<String, BroadcastDate>>,
    feed_available: bool,
    cache: DetailCache,
}

impl<'a> Enricher<'a> {
    pub fn new(fetcher: &'a Fetcher, config: &'a Config, feed_url: impl Into<String>) -> Result<Self> {
        let selector = &config.selectors.detail_date;
        let detail_selector =
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        Ok(Self {
            fetcher,
            config,
            feed_url: feed_url.into(),
            detail_selector,
            feed_index: None,
            feed_available: false,
            cache: DetailCache::default(),
        })
    }

    pub fn cache(&self) -> &DetailCache {
        &self.cache
    }

    /// Run every enabled stage over the records.
    pub async fn enrich(&mut self, records: &mut [LineupRecord]) -> EnrichmentReport {
        let mut report = EnrichmentReport {
            missing_before: count_missing(records),
            ..EnrichmentReport::default()
        };

        if report.missing_before > 0 && self.config.enrichment.feed_enabled {
            self.apply_feed(records, &mut report).await;
        }
        if count_missing(records) > 0 && self.config.enrichment.detail_enabled {
            self.apply_details(records, &mut report).await;
        }

        report.still_missing = count_missing(records);
        report
    }

    async fn apply_feed(&mut self, records: &mut [LineupRecord], report: &mut EnrichmentReport) {
        if self.feed_index.is_none() {
            let index = match self
                .fetcher
                .get_json::<serde_json::Value>(&self.feed_url, &[])
                .await
            {
                Ok(payload) => {
                    self.feed_available = true;
                    build_feed_index(&payload)
                }
                Err(e) => {
                    log::warn!("Schedule feed unavailable: {}", e);
                    HashMap::new()
                }
            };
            log::debug!("Schedule feed has {} dated works", index.len());
            self.feed_index = Some(index);
        }

        report.feed_available = self.feed_available;
        if let Some(index) = &self.feed_index {
            report.resolved_by_feed = apply_feed_index(records, index);
        }
    }

    async fn apply_details(&mut self, records: &mut [LineupRecord], report: &mut EnrichmentReport) {
        let cooldown = Duration::from_millis(self.config.enrichment.detail_cooldown_ms);
        let page_url = self.config.source.page_url.clone();

        for record in records.iter_mut().filter(|r| !r.is_resolved()) {
            let Some(link) = record.source_link.as_deref().filter(|l| is_fetchable(l)) else {
                continue;
            };
            let url = resolve(&page_url, link.trim()).unwrap_or_else(|| link.to_string());

            let found = match self.cache.get(&url).cloned() {
                Some(cached) => {
                    report.cache_hits += 1;
                    cached
                }
                None => {
                    if report.detail_requests > 0 && !cooldown.is_zero() {
                        tokio::time::sleep(cooldown).await;
                    }
                    report.detail_requests += 1;
                    let found = self.fetch_detail(&url).await;
                    self.cache.insert(url, found.clone());
                    found
                }
            };

            if let Some((date, text)) = found {
                if record.resolve_with_text(date, text) {
                    report.resolved_by_detail += 1;
                }
            }
        }
    }

    async fn fetch_detail(&self, url: &str) -> Option<(BroadcastDate, String)> {
        match self.fetcher.get_detail(url).await {
            Ok(html) => parse_detail_date(&html, &self.detail_selector),
            Err(e) => {
                log::debug!("Detail page failed: {}", e);
                None
            }
        }
    }
}

/// Fragment-only links identify a work but name no page.
fn is_fetchable(link: &str) -> bool {
    let link = link.trim();
    !link.is_empty() && !link.starts_with('#')
}

fn count_missing(records: &[LineupRecord]) -> usize {
    records.iter().filter(|r| !r.is_resolved()).count()
}

/// Map work identifiers to dates from a feed payload.
///
/// Anything other than a list of objects contributes nothing.
pub fn build_feed_index(payload: &serde_json::Value) -> HashMap<String, BroadcastDate> {
    let Some(items) = payload.as_array() else {
        return HashMap::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| serde_json::from_value::<FeedItem>(item.clone()).ok())
        .filter_map(|item| {
            let date = BroadcastDate::parse_sentence(item.workmaintxt.as_deref()?)?;
            let work_id = extract_work_id(item.worklink.as_deref()?)?;
            Some((work_id, date))
        })
        .collect()
}

/// Resolve undated records whose link carries an indexed work id.
pub fn apply_feed_index(
    records: &mut [LineupRecord],
    index: &HashMap<String, BroadcastDate>,
) -> usize {
    if index.is_empty() {
        return 0;
    }

    let mut resolved = 0;
    for record in records.iter_mut().filter(|r| !r.is_resolved()) {
        let date = record
            .source_link
            .as_deref()
            .and_then(extract_work_id)
            .and_then(|id| index.get(&id).copied());
        if let Some(date) = date {
            if record.resolve(date) {
                resolved += 1;
            }
        }
    }
    resolved
}

/// Read the start date from a detail page (`10月6日～`).
pub fn parse_detail_date(html: &str, selector: &Selector) -> Option<(BroadcastDate, String)> {
    let document = Html::parse_document(html);
    let element = document.select(selector).next()?;
    let mut text: String = element.text().map(str::trim).collect();

    if !DETAIL_DATE_PATTERN.is_match(&text) {
        return None;
    }
    if !text.ends_with('～') {
        text.push('～');
    }
    let date = BroadcastDate::parse_month_day(&text)?;
    Some((date, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Weekday;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(title: &str, link: Option<&str>) -> LineupRecord {
        let mut record = LineupRecord::new(Weekday::Monday, title, 1);
        record.source_link = link.map(str::to_string);
        record
    }

    fn detail_selector() -> Selector {
        Selector::parse("div.streamingDate").unwrap()
    }

    fn test_config(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.source.page_url = format!("{}/lineup", server.uri());
        config.enrichment.detail_cooldown_ms = 0;
        config
    }

    #[test]
    fn test_feed_index() {
        let payload = json!([
            {"workmaintxt": "2025年10月6日(月)18:00～", "worklink": "#/animestore/ci?workId=28251"},
            {"workmaintxt": "近日配信", "worklink": "#/animestore/ci?workId=1"},
            {"workmaintxt": "2025年10月7日", "worklink": "#/animestore/ci"},
            "not an object",
            {"workmaintxt": 12}
        ]);
        let index = build_feed_index(&payload);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("28251"), BroadcastDate::new(10, 6).as_ref());
    }

    #[test]
    fn test_feed_index_ignores_non_list() {
        assert!(build_feed_index(&json!({"workmaintxt": "2025年10月6日"})).is_empty());
    }

    #[test]
    fn test_apply_feed_index() {
        let index: HashMap<_, _> = [("28251".to_string(), BroadcastDate::new(10, 6).unwrap())]
            .into_iter()
            .collect();
        let mut records = vec![
            record("A", Some("https://example.com/ci_pc?workId=28251")),
            record("B", Some("https://example.com/ci_pc?workId=99")),
            record("C", None),
        ];
        assert_eq!(apply_feed_index(&mut records, &index), 1);
        assert_eq!(records[0].broadcast_date(), BroadcastDate::new(10, 6));
        assert_eq!(records[0].date_text, "10月6日～");
        assert!(!records[1].is_resolved());
    }

    #[test]
    fn test_feed_never_overwrites() {
        let index: HashMap<_, _> = [("28251".to_string(), BroadcastDate::new(10, 6).unwrap())]
            .into_iter()
            .collect();
        let mut records = vec![record("A", Some("?workId=28251"))];
        records[0].resolve(BroadcastDate::new(1, 1).unwrap());
        assert_eq!(apply_feed_index(&mut records, &index), 0);
        assert_eq!(records[0].broadcast_date(), BroadcastDate::new(1, 1));
    }

    #[test]
    fn test_parse_detail_date() {
        let sel = detail_selector();
        assert_eq!(
            parse_detail_date(r#"<div class="streamingDate">10月6日～</div>"#, &sel),
            Some((BroadcastDate::new(10, 6).unwrap(), "10月6日～".to_string()))
        );
        assert_eq!(
            parse_detail_date(r#"<div class="streamingDate"> 1月9日 </div>"#, &sel),
            Some((BroadcastDate::new(1, 9).unwrap(), "1月9日～".to_string()))
        );
        assert_eq!(
            parse_detail_date(r#"<div class="streamingDate">近日配信</div>"#, &sel),
            None
        );
        assert_eq!(parse_detail_date("<div></div>", &sel), None);
    }

    #[tokio::test]
    async fn test_detail_requests_are_cached_per_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/detail/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<div class="streamingDate">10月8日～</div>"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config(&server);
        config.enrichment.feed_enabled = false;
        let fetcher = Fetcher::with_client(Client::new(), &config.source.page_url, "image/*");
        let link = format!("{}/detail/1", server.uri());
        let mut records = vec![
            record("A", Some(&link)),
            record("B", Some(&link)),
            record("C", Some(&link)),
        ];

        let mut enricher = Enricher::new(&fetcher, &config, "unused").unwrap();
        let report = enricher.enrich(&mut records).await;

        assert_eq!(report.missing_before, 3);
        assert_eq!(report.detail_requests, 1);
        assert_eq!(report.cache_hits, 2);
        assert_eq!(report.resolved_by_detail, 3);
        assert_eq!(report.still_missing, 0);
        assert_eq!(enricher.cache().len(), 1);
        assert!(records.iter().all(|r| r.date_text == "10月8日～"));
    }

    #[tokio::test]
    async fn test_misses_are_cached_too() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/detail/404"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config(&server);
        config.enrichment.feed_enabled = false;
        let fetcher = Fetcher::with_client(Client::new(), &config.source.page_url, "image/*");
        let link = format!("{}/detail/404", server.uri());
        let mut records = vec![record("A", Some(&link)), record("B", Some(&link))];

        let mut enricher = Enricher::new(&fetcher, &config, "unused").unwrap();
        let report = enricher.enrich(&mut records).await;
        assert_eq!(report.detail_requests, 1);
        assert_eq!(report.still_missing, 2);
    }

    #[tokio::test]
    async fn test_feed_then_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"workmaintxt": "2025年10月6日(月)", "worklink": "#/animestore/ci?workId=28251"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/animestore/ci_pc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<div class="streamingDate">10月9日</div>"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(&server);
        let fetcher = Fetcher::with_client(Client::new(), &config.source.page_url, "image/*");
        let mut records = vec![
            record("A", Some("/animestore/ci_pc?workId=28251")),
            record("B", Some("/animestore/ci_pc?workId=555")),
            record("C", None),
        ];
        records.push({
            let mut done = record("D", Some("/animestore/ci_pc?workId=28251"));
            done.resolve(BroadcastDate::new(12, 24).unwrap());
            done
        });

        let mut enricher =
            Enricher::new(&fetcher, &config, format!("{}/feed.json", server.uri())).unwrap();
        let report = enricher.enrich(&mut records).await;

        assert!(report.feed_available);
        assert_eq!(report.missing_before, 3);
        assert_eq!(report.resolved_by_feed, 1);
        assert_eq!(report.resolved_by_detail, 1);
        assert_eq!(report.detail_requests, 1);
        assert_eq!(report.still_missing, 1);
        assert_eq!(records[0].broadcast_date(), BroadcastDate::new(10, 6));
        assert_eq!(records[1].date_text, "10月9日～");
        assert_eq!(records[3].broadcast_date(), BroadcastDate::new(12, 24));

        let again = enricher.enrich(&mut records).await;
        assert_eq!(again.missing_before, 1);
        assert_eq!(records[0].broadcast_date(), BroadcastDate::new(10, 6));
    }

    #[tokio::test]
    async fn test_cooldown_between_distinct_requests_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(3)
            .mount(&server)
            .await;

        let mut config = test_config(&server);
        config.enrichment.feed_enabled = false;
        config.enrichment.detail_cooldown_ms = 300;
        let fetcher = Fetcher::with_client(Client::new(), &config.source.page_url, "image/*");
        let link = |n: u32| format!("{}/detail/{n}", server.uri());
        let mut records = vec![
            record("A", Some(&link(1))),
            record("B", Some(&link(2))),
            record("C", Some(&link(1))),
            record("D", Some(&link(3))),
        ];

        let mut enricher = Enricher::new(&fetcher, &config, "unused").unwrap();
        let started = std::time::Instant::now();
        let report = enricher.enrich(&mut records).await;
        let elapsed = started.elapsed();

        assert_eq!(report.detail_requests, 3);
        assert_eq!(report.cache_hits, 1);
        // two pauses: none before the first request, none on the cache hit
        assert!(elapsed >= Duration::from_millis(600), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(900), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_fragment_links_match_feed_but_are_not_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"workmaintxt": "2025年10月6日(月)", "worklink": "#/animestore/ci?workId=28251"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/lineup"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = test_config(&server);
        let fetcher = Fetcher::with_client(Client::new(), &config.source.page_url, "image/*");
        let mut records = vec![
            record("A", Some("#/animestore/ci?workId=28251")),
            record("B", Some("#/animestore/ci?workId=7")),
        ];

        let mut enricher =
            Enricher::new(&fetcher, &config, format!("{}/feed.json", server.uri())).unwrap();
        let report = enricher.enrich(&mut records).await;

        assert_eq!(report.resolved_by_feed, 1);
        assert_eq!(report.detail_requests, 0);
        assert_eq!(records[0].broadcast_date(), BroadcastDate::new(10, 6));
        assert!(!records[1].is_resolved());
    }

    #[tokio::test]
    async fn test_disabled_stages_issue_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = test_config(&server);
        config.enrichment.feed_enabled = false;
        config.enrichment.detail_enabled = false;
        let fetcher = Fetcher::with_client(Client::new(), &config.source.page_url, "image/*");
        let mut records = vec![record("A", Some(&format!("{}/detail/1", server.uri())))];

        let mut enricher =
            Enricher::new(&fetcher, &config, format!("{}/feed.json", server.uri())).unwrap();
        let report = enricher.enrich(&mut records).await;
        assert_eq!(report.still_missing, 1);
        assert!(!report.feed_available);
    }
}
