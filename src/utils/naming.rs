// src/utils/naming.rs

//! File names for downloaded thumbnails.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Weekday;
use crate::utils::strip_query;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s/\\]+").unwrap());
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-zぁ-んァ-ヶ一-龠_ー-]").unwrap());

const MAX_SLUG_CHARS: usize = 60;

/// File-system safe form of a title.
pub fn slugify(title: &str) -> String {
    let joined = SEPARATORS.replace_all(title.trim(), "_");
    let cleaned = DISALLOWED.replace_all(&joined, "");
    let slug: String = cleaned.chars().take(MAX_SLUG_CHARS).collect();
    if slug.is_empty() {
        "no_title".to_string()
    } else {
        slug
    }
}

/// Extension (with leading dot, lowercased) of the last path segment of a URL.
pub fn url_extension(url: &str) -> Option<String> {
    let path = strip_query(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 5 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

/// Target file name of a record's thumbnail.
///
/// The weekday code prefix keeps names unique when two blocks hold the same
/// title at the same position.
pub fn image_filename(
    weekday: Weekday,
    ordinal: usize,
    title: &str,
    image_url: &str,
    default_ext: &str,
) -> String {
    let ext = url_extension(image_url).unwrap_or_else(|| default_ext.to_string());
    format!("{}_{:02}_{}{}", weekday.code(), ordinal, slugify(title), ext)
}

/// Swap the extension of a file name.
pub fn with_extension(filename: &str, ext: &str) -> String {
    let stem = filename.rsplit_once('.').map_or(filename, |(stem, _)| stem);
    format!("{stem}{ext}")
}
