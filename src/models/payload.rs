// src/models/payload.rs

//! Wire formats of the lineup API and the secondary schedule feed.

use serde::Deserialize;

/// Top-level lineup API response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineupResponse {
    #[serde(default)]
    pub data: Option<LineupData>,
}

impl LineupResponse {
    /// Work entries, empty when the payload has none.
    pub fn works(&self) -> &[WorkEntry] {
        self.data
            .as_ref()
            .and_then(|d| d.work_list.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineupData {
    #[serde(default)]
    pub work_list: Option<Vec<WorkEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntry {
    #[serde(default)]
    pub work_info: Option<WorkInfo>,
}

/// Per-title fields of a work entry. Every field may be missing or null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkInfo {
    #[serde(default)]
    pub work_title: Option<String>,
    #[serde(default)]
    pub work_week: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub main_key_visual_path: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// One item of the secondary schedule feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedItem {
    /// Free-text date sentence, e.g. `2025年10月6日(月)18:00～`
    #[serde(default)]
    pub workmaintxt: Option<String>,

    /// In-site link carrying the work identifier
    #[serde(default)]
    pub worklink: Option<String>,
}
