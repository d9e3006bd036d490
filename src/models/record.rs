// src/models/record.rs

//! Lineup record, weekday and broadcast date.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static SCHEDULE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})/(\d{1,2})/(\d{1,2})$").unwrap());
static MONTH_DAY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})月(\d{1,2})").unwrap());
static DATE_SENTENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日").unwrap());

/// Day of the week a title is broadcast on.
///
/// Declaration order is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    Other,
}

impl Weekday {
    /// All buckets in output order.
    pub const ALL: [Weekday; 8] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
        Weekday::Other,
    ];

    /// Map the API's three-letter week code. Unknown or empty codes are `Other`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "mon" => Weekday::Monday,
            "tue" => Weekday::Tuesday,
            "wed" => Weekday::Wednesday,
            "thu" => Weekday::Thursday,
            "fri" => Weekday::Friday,
            "sat" => Weekday::Saturday,
            "sun" => Weekday::Sunday,
            _ => Weekday::Other,
        }
    }

    /// Map a localized day label such as `月曜`.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|day| day.label() == label.trim())
            .unwrap_or(Weekday::Other)
    }

    /// Localized label used in CSV output.
    pub fn label(&self) -> &'static str {
        match self {
            Weekday::Monday => "月曜",
            Weekday::Tuesday => "火曜",
            Weekday::Wednesday => "水曜",
            Weekday::Thursday => "木曜",
            Weekday::Friday => "金曜",
            Weekday::Saturday => "土曜",
            Weekday::Sunday => "日曜",
            Weekday::Other => "その他",
        }
    }

    /// Short ASCII code, used as a file name prefix.
    pub fn code(&self) -> &'static str {
        match self {
            Weekday::Monday => "mon",
            Weekday::Tuesday => "tue",
            Weekday::Wednesday => "wed",
            Weekday::Thursday => "thu",
            Weekday::Friday => "fri",
            Weekday::Saturday => "sat",
            Weekday::Sunday => "sun",
            Weekday::Other => "oth",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Broadcast start as (month, day). The year is implied by the season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BroadcastDate {
    pub month: u32,
    pub day: u32,
}

impl BroadcastDate {
    /// Sorts after every real date.
    pub const UNRESOLVED: BroadcastDate = BroadcastDate {
        month: u32::MAX,
        day: u32::MAX,
    };

    /// Build a date, rejecting out-of-range values.
    pub fn new(month: u32, day: u32) -> Option<Self> {
        ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some(Self { month, day })
    }

    /// Parse an API schedule string of the exact form `YYYY/M/D`.
    pub fn parse_schedule(schedule: &str) -> Option<Self> {
        let caps = SCHEDULE_PATTERN.captures(schedule.trim())?;
        Self::new(caps[2].parse().ok()?, caps[3].parse().ok()?)
    }

    /// Parse the first `M月D` occurrence, e.g. `10月6日～`.
    pub fn parse_month_day(text: &str) -> Option<Self> {
        let caps = MONTH_DAY_PATTERN.captures(text)?;
        Self::new(caps[1].parse().ok()?, caps[2].parse().ok()?)
    }

    /// Parse a full date sentence such as `2025年10月6日(月)18:00～`.
    pub fn parse_sentence(text: &str) -> Option<Self> {
        let caps = DATE_SENTENCE_PATTERN.captures(text)?;
        Self::new(caps[2].parse().ok()?, caps[3].parse().ok()?)
    }

    /// Zero-padded `MM/DD` form.
    pub fn padded(&self) -> String {
        format!("{:02}/{:02}", self.month, self.day)
    }
}

impl fmt::Display for BroadcastDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}月{}日～", self.month, self.day)
    }
}

/// One broadcast-schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupRecord {
    /// Day bucket
    pub weekday: Weekday,

    /// Display title, never empty
    pub title: String,

    /// Resolved broadcast start; set at most once
    broadcast_date: Option<BroadcastDate>,

    /// Date string shown in the CSV (e.g. `10月6日～`)
    pub date_text: String,

    /// Image URL shown in the CSV
    pub image_url: String,

    /// Download candidates, highest priority first
    pub image_candidates: Vec<String>,

    /// Detail page URL or identifier-bearing link
    pub source_link: Option<String>,

    /// 1-based position within the weekday block
    pub ordinal: usize,

    /// File name under the images directory
    pub local_image_filename: String,
}

impl LineupRecord {
    /// Create a record with no resolved date.
    pub fn new(weekday: Weekday, title: impl Into<String>, ordinal: usize) -> Self {
        Self {
            weekday,
            title: title.into(),
            broadcast_date: None,
            date_text: String::new(),
            image_url: String::new(),
            image_candidates: Vec::new(),
            source_link: None,
            ordinal,
            local_image_filename: String::new(),
        }
    }

    pub fn broadcast_date(&self) -> Option<BroadcastDate> {
        self.broadcast_date
    }

    pub fn is_resolved(&self) -> bool {
        self.broadcast_date.is_some()
    }

    /// Resolve the broadcast date with its canonical display string.
    ///
    /// Returns `false` and leaves the record untouched if already resolved.
    pub fn resolve(&mut self, date: BroadcastDate) -> bool {
        self.resolve_with_text(date, date.to_string())
    }

    /// Resolve the broadcast date keeping a source-provided display string.
    pub fn resolve_with_text(&mut self, date: BroadcastDate, text: impl Into<String>) -> bool {
        if self.broadcast_date.is_some() {
            return false;
        }
        self.broadcast_date = Some(date);
        self.date_text = text.into();
        true
    }

    /// Key used for ordering within a weekday bucket.
    pub fn sort_key(&self) -> (BroadcastDate, &str) {
        (
            self.broadcast_date.unwrap_or(BroadcastDate::UNRESOLVED),
            self.title.as_str(),
        )
    }
}
