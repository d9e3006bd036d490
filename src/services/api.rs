// src/services/api.rs

//! Lineup API source.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{FetchError, Result};
use crate::models::{BroadcastDate, Config, LineupRecord, LineupResponse, Season, Weekday};
use crate::services::Fetcher;
use crate::services::source::{LineupSource, ParsedLineup, RawLineup};
use crate::utils::naming::image_filename;
use crate::utils::strip_query;

/// Reads the season lineup from the JSON API.
pub struct ApiLineupSource<'a> {
    fetcher: &'a Fetcher,
    config: &'a Config,
    season: Season,
}

impl<'a> ApiLineupSource<'a> {
    pub fn new(fetcher: &'a Fetcher, config: &'a Config, season: Season) -> Self {
        Self {
            fetcher,
            config,
            season,
        }
    }
}

#[async_trait]
impl LineupSource for ApiLineupSource<'_> {
    fn name(&self) -> &'static str {
        "api"
    }

    fn snapshot_name(&self) -> &'static str {
        "_lineup.json"
    }

    async fn fetch(&self) -> Result<RawLineup> {
        let code = self.season.code();
        let url = &self.config.source.api_url;
        let query = [
            ("cours", code.as_str()),
            ("includeOthersFlag", "1"),
            ("tvProgramFlag", "1"),
            ("vodTypeList", "svod_tvod"),
        ];
        let body = self.fetcher.get_text(url, &query).await?;
        Ok(RawLineup::new(url.as_str(), body))
    }

    fn parse(&self, raw: &RawLineup) -> Result<ParsedLineup> {
        let response: LineupResponse =
            serde_json::from_str(&raw.body).map_err(|e| FetchError::Decode {
                url: raw.url.clone(),
                cause: e.to_string(),
            })?;
        Ok(ParsedLineup {
            records: parse_api(&response, &self.config.images.default_extension),
            warnings: Vec::new(),
        })
    }
}

/// Convert an API response into records, in payload order.
pub fn parse_api(response: &LineupResponse, default_ext: &str) -> Vec<LineupRecord> {
    let mut counters: HashMap<Weekday, usize> = HashMap::new();
    let mut records = Vec::new();

    for info in response.works().iter().filter_map(|w| w.work_info.as_ref()) {
        let title = info.work_title.as_deref().unwrap_or("").trim();
        if title.is_empty() {
            continue;
        }

        let weekday = Weekday::from_code(info.work_week.as_deref().unwrap_or(""));
        let ordinal = counters.entry(weekday).or_default();
        *ordinal += 1;

        let mut record = LineupRecord::new(weekday, title, *ordinal);
        if let Some(date) = info
            .schedule
            .as_deref()
            .and_then(BroadcastDate::parse_schedule)
        {
            record.resolve(date);
        }

        let image = strip_query(info.main_key_visual_path.as_deref().unwrap_or("").trim());
        if !image.is_empty() {
            record.image_url = image.to_string();
            record.image_candidates.push(image.to_string());
        }

        record.source_link = info
            .link
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string);
        record.local_image_filename =
            image_filename(weekday, record.ordinal, title, &record.image_url, default_ext);

        records.push(record);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> LineupResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_single_entry() {
        let records = parse_api(
            &response(
                r#"{"data":{"workList":[{"workInfo":{
                    "workTitle":"Title A","workWeek":"mon","schedule":"2025/10/6",
                    "mainKeyVisualPath":"https://img.example.com/a.jpg?v=1",
                    "link":"https://example.com/ci_pc?workId=28251"}}]}}"#,
            ),
            ".png",
        );

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.weekday, Weekday::Monday);
        assert_eq!(record.weekday.label(), "月曜");
        assert_eq!(record.broadcast_date(), BroadcastDate::new(10, 6));
        assert_eq!(record.date_text, "10月6日～");
        assert_eq!(record.image_url, "https://img.example.com/a.jpg");
        assert_eq!(record.image_candidates, vec!["https://img.example.com/a.jpg"]);
        assert_eq!(
            record.source_link.as_deref(),
            Some("https://example.com/ci_pc?workId=28251")
        );
        assert_eq!(record.local_image_filename, "mon_01_Title_A.jpg");
    }

    #[test]
    fn test_blank_titles_dropped() {
        let records = parse_api(
            &response(
                r#"{"data":{"workList":[
                    {"workInfo":{"workTitle":"  ","workWeek":"mon"}},
                    {"workInfo":{"workTitle":null,"workWeek":"tue"}},
                    {"workInfo":null},
                    {"workInfo":{"workTitle":"Kept","workWeek":"tue"}}]}}"#,
            ),
            ".png",
        );
        assert_eq!(records.len(), 1);
        assert!(records.iter().all(|r| !r.title.trim().is_empty()));
    }

    #[test]
    fn test_unknown_week_and_bad_schedule() {
        let records = parse_api(
            &response(
                r#"{"data":{"workList":[
                    {"workInfo":{"workTitle":"A","workWeek":"xyz","schedule":"2025-10-06"}},
                    {"workInfo":{"workTitle":"B"}}]}}"#,
            ),
            ".png",
        );
        assert_eq!(records[0].weekday, Weekday::Other);
        assert!(!records[0].is_resolved());
        assert_eq!(records[1].weekday, Weekday::Other);
        assert_eq!(records[1].ordinal, 2);
        assert_eq!(records[1].local_image_filename, "oth_02_B.png");
    }

    #[test]
    fn test_ordinals_count_per_weekday() {
        let records = parse_api(
            &response(
                r#"{"data":{"workList":[
                    {"workInfo":{"workTitle":"A","workWeek":"mon"}},
                    {"workInfo":{"workTitle":"B","workWeek":"tue"}},
                    {"workInfo":{"workTitle":"C","workWeek":"mon"}}]}}"#,
            ),
            ".png",
        );
        let ordinals: Vec<_> = records.iter().map(|r| (r.weekday, r.ordinal)).collect();
        assert_eq!(
            ordinals,
            vec![
                (Weekday::Monday, 1),
                (Weekday::Tuesday, 1),
                (Weekday::Monday, 2)
            ]
        );
    }

    #[test]
    fn test_empty_payload() {
        assert!(parse_api(&response(r#"{"data":{}}"#), ".png").is_empty());
    }
}
