// src/services/dom.rs

//! Lineup page source.
//!
//! Walks the weekday blocks of the lineup page markup.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{BroadcastDate, Config, LineupRecord, LineupSelectors, Weekday};
use crate::services::Fetcher;
use crate::services::source::{LineupSource, ParsedLineup, RawLineup};
use crate::utils::naming::image_filename;
use crate::utils::{extract_work_id, resolve_url};

/// Reads the season lineup from the static page markup.
pub struct DomLineupSource<'a> {
    fetcher: &'a Fetcher,
    config: &'a Config,
}

impl<'a> DomLineupSource<'a> {
    pub fn new(fetcher: &'a Fetcher, config: &'a Config) -> Self {
        Self { fetcher, config }
    }
}

#[async_trait]
impl LineupSource for DomLineupSource<'_> {
    fn name(&self) -> &'static str {
        "dom"
    }

    fn snapshot_name(&self) -> &'static str {
        "_live.html"
    }

    async fn fetch(&self) -> Result<RawLineup> {
        let url = &self.config.source.page_url;
        let body = self.fetcher.get_text(url, &[]).await?;
        let mut raw = RawLineup::new(url.as_str(), body);
        raw.warning = marker_warning(&raw.body, &self.config.source.expected_marker);
        Ok(raw)
    }

    fn parse(&self, raw: &RawLineup) -> Result<ParsedLineup> {
        parse_lineup_page(raw, self.config)
    }
}

/// Parse page markup into records, attaching structure warnings when empty.
pub(crate) fn parse_lineup_page(raw: &RawLineup, config: &Config) -> Result<ParsedLineup> {
    let records = parse_dom(
        &raw.body,
        &config.selectors,
        &raw.url,
        &config.images.default_extension,
    )?;
    let mut warnings = Vec::new();
    if records.is_empty() {
        warnings.extend(structure_warning(
            &raw.body,
            &config.selectors,
            &config.source.expected_marker,
        ));
    }
    Ok(ParsedLineup { records, warnings })
}

/// Warning when the page lacks the text every lineup page carries.
pub fn marker_warning(html: &str, marker: &str) -> Option<String> {
    (!marker.is_empty() && !html.contains(marker)).then(|| {
        format!("expected marker '{marker}' not found (login required or layout changed)")
    })
}

/// Explain an empty parse result from the raw markup.
pub fn structure_warning(html: &str, selectors: &LineupSelectors, marker: &str) -> Option<String> {
    let block = class_token(&selectors.week_block);
    let item = class_token(&selectors.item_any);
    if !block.is_empty() && html.contains(block) && !item.is_empty() && !html.contains(item) {
        return Some(format!(
            "layout may have changed: '{block}' present but no '{item}'"
        ));
    }
    if !marker.is_empty() && !html.contains(marker) {
        return Some(format!("'{marker}' absent (login required or layout changed)"));
    }
    None
}

/// Last class name of a simple selector (`div.weekWrapper` -> `weekWrapper`).
fn class_token(selector: &str) -> &str {
    let tail = selector.rsplit('.').next().unwrap_or("");
    let end = tail
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(tail.len());
    &tail[..end]
}

/// Compiled selectors used by the parser.
struct Compiled {
    container: Selector,
    week_block: Selector,
    week_label: Selector,
    item_any: Selector,
    item: Selector,
    date: Selector,
    title: Selector,
    image: Selector,
    link: Selector,
}

impl Compiled {
    fn new(s: &LineupSelectors) -> Result<Self> {
        Ok(Self {
            container: parse_selector(&s.container)?,
            week_block: parse_selector(&s.week_block)?,
            week_label: parse_selector(&s.week_label)?,
            item_any: parse_selector(&s.item_any)?,
            item: parse_selector(&s.item)?,
            date: parse_selector(&s.date)?,
            title: parse_selector(&s.title)?,
            image: parse_selector(&s.image)?,
            link: parse_selector(&s.link)?,
        })
    }
}

/// Parse lineup page markup.
///
/// A missing container is a structure error; a container without weekday
/// blocks yields no records.
pub fn parse_dom(
    html: &str,
    selectors: &LineupSelectors,
    page_url: &str,
    default_ext: &str,
) -> Result<Vec<LineupRecord>> {
    let sel = Compiled::new(selectors)?;
    let document = Html::parse_document(html);
    let base_url = Url::parse(page_url).ok();

    let container = document.select(&sel.container).next().ok_or_else(|| {
        AppError::structure(format!(
            "lineup container '{}' not found",
            selectors.container
        ))
    })?;

    let mut records = Vec::new();
    for block in container.select(&sel.week_block) {
        let Some(label_elem) = block.select(&sel.week_label).next() else {
            continue;
        };
        let label = element_text(&label_elem).replace(&selectors.label_suffix, "");
        if !label.ends_with(&selectors.label_terminator) {
            log::debug!("Skipping block with label '{}'", label);
            continue;
        }
        let weekday = Weekday::from_label(&label);

        let Some(wrapper) = next_wrapper(&label_elem, &selectors.item_wrapper_class) else {
            continue;
        };
        if wrapper.select(&sel.item_any).next().is_none()
            && element_text(&wrapper).contains(&selectors.empty_placeholder)
        {
            continue;
        }

        for (idx, module) in wrapper.select(&sel.item).enumerate() {
            let ordinal = idx + 1;
            let title = first_text(&module, &sel.title);
            if title.is_empty() {
                continue;
            }

            let mut record = LineupRecord::new(weekday, title, ordinal);

            let caption = first_text(&module, &sel.date);
            match BroadcastDate::parse_month_day(&caption) {
                Some(date) => {
                    record.resolve_with_text(date, caption);
                }
                None => record.date_text = caption,
            }

            if let Some(img) = module.select(&sel.image).next() {
                for attr in &selectors.image_attrs {
                    let Some(value) = img.value().attr(attr).map(str::trim) else {
                        continue;
                    };
                    if value.is_empty() {
                        continue;
                    }
                    let candidate = absolutize(base_url.as_ref(), value);
                    if !record.image_candidates.contains(&candidate) {
                        record.image_candidates.push(candidate);
                    }
                }
            }
            record.image_url = record.image_candidates.first().cloned().unwrap_or_default();

            record.source_link = module
                .select(&sel.link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::trim)
                .filter(|href| {
                    !href.is_empty() && (!href.starts_with('#') || extract_work_id(href).is_some())
                })
                .map(|href| absolutize(base_url.as_ref(), href));

            record.local_image_filename = image_filename(
                weekday,
                ordinal,
                &record.title,
                &record.image_url,
                default_ext,
            );
            records.push(record);
        }
    }

    Ok(records)
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Text content with each fragment trimmed and joined.
fn element_text(elem: &ElementRef) -> String {
    elem.text().map(str::trim).collect()
}

fn first_text(scope: &ElementRef, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|e| element_text(&e))
        .unwrap_or_default()
}

/// Next sibling `div` whose class contains `class_fragment`.
fn next_wrapper<'a>(label: &ElementRef<'a>, class_fragment: &str) -> Option<ElementRef<'a>> {
    label
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| {
            e.value().name() == "div" && e.value().classes().any(|c| c.contains(class_fragment))
        })
}

/// Resolve URL-like candidates against the page; leave anything else verbatim.
fn absolutize(base: Option<&Url>, value: &str) -> String {
    let url_like = value.starts_with("//") || value.starts_with('/') || value.starts_with("./");
    match base {
        Some(base) if url_like => resolve_url(base, value),
        _ => value.to_string(),
    }
}
