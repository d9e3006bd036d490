// src/models/selectors.rs

//! CSS selectors and marker tokens for scraping the lineup page.

use serde::{Deserialize, Serialize};

/// CSS selectors and marker tokens for the lineup page and detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupSelectors {
    /// Selector for the single lineup container
    #[serde(default = "defaults::container")]
    pub container: String,

    /// Selector for each weekday block
    #[serde(default = "defaults::week_block")]
    pub week_block: String,

    /// Selector for the weekday label within a block
    #[serde(default = "defaults::week_label")]
    pub week_label: String,

    /// Token stripped from the weekday label
    #[serde(default = "defaults::label_suffix")]
    pub label_suffix: String,

    /// A valid weekday label must end with this token
    #[serde(default = "defaults::label_terminator")]
    pub label_terminator: String,

    /// Class fragment identifying the item wrapper following a block
    #[serde(default = "defaults::item_wrapper_class")]
    pub item_wrapper_class: String,

    /// Selector for any item module (used for the empty-block check)
    #[serde(default = "defaults::item_any")]
    pub item_any: String,

    /// Selector for each listed item
    #[serde(default = "defaults::item")]
    pub item: String,

    /// Text shown by an empty weekday block
    #[serde(default = "defaults::empty_placeholder")]
    pub empty_placeholder: String,

    /// Start-date caption within an item
    #[serde(default = "defaults::date")]
    pub date: String,

    /// Title within an item
    #[serde(default = "defaults::title")]
    pub title: String,

    /// Thumbnail image within an item
    #[serde(default = "defaults::image")]
    pub image: String,

    /// Image attributes, in candidate priority order
    #[serde(default = "defaults::image_attrs")]
    pub image_attrs: Vec<String>,

    /// Optional link within an item
    #[serde(default = "defaults::link")]
    pub link: String,

    /// Start-date element on a detail page
    #[serde(default = "defaults::detail_date")]
    pub detail_date: String,
}

impl Default for LineupSelectors {
    fn default() -> Self {
        Self {
            container: defaults::container(),
            week_block: defaults::week_block(),
            week_label: defaults::week_label(),
            label_suffix: defaults::label_suffix(),
            label_terminator: defaults::label_terminator(),
            item_wrapper_class: defaults::item_wrapper_class(),
            item_any: defaults::item_any(),
            item: defaults::item(),
            empty_placeholder: defaults::empty_placeholder(),
            date: defaults::date(),
            title: defaults::title(),
            image: defaults::image(),
            image_attrs: defaults::image_attrs(),
            link: defaults::link(),
            detail_date: defaults::detail_date(),
        }
    }
}

mod defaults {
    pub fn container() -> String {
        "#newContents".into()
    }
    pub fn week_block() -> String {
        "div.weekWrapper".into()
    }
    pub fn week_label() -> String {
        ".weekText".into()
    }
    pub fn label_suffix() -> String {
        "配信".into()
    }
    pub fn label_terminator() -> String {
        "曜".into()
    }
    pub fn item_wrapper_class() -> String {
        "itemWrapper".into()
    }
    pub fn item_any() -> String {
        "div.itemModule".into()
    }
    pub fn item() -> String {
        "div.itemModule.list".into()
    }
    pub fn empty_placeholder() -> String {
        "配信作品はありません".into()
    }
    pub fn date() -> String {
        "header .streamingDate".into()
    }
    pub fn title() -> String {
        "p.newTVtitle span".into()
    }
    pub fn image() -> String {
        ".thumbnailArea img".into()
    }
    pub fn image_attrs() -> Vec<String> {
        vec!["alt".into(), "data-src".into(), "src".into()]
    }
    pub fn link() -> String {
        "a[href]".into()
    }
    pub fn detail_date() -> String {
        "div.streamingDate".into()
    }
}
