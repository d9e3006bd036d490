// src/storage/export.rs

//! Lineup CSV emission.

use crate::error::{AppError, Result};
use crate::models::{LineupRecord, SourceVariant};
use crate::pipeline::DayGroup;

const BOM: &[u8] = b"\xEF\xBB\xBF";

const GROUPED_HEADER: [&str; 4] = ["放送日", "タイトル", "画像URL", "画像ファイル名"];
const FLAT_HEADER: [&str; 5] = ["曜日", "放送開始日", "タイトル", "画像URL", "画像ファイル名"];

/// CSV shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// Per day: heading row, column header, rows, blank line
    Grouped,
    /// One header, one row per record in day order
    Flat,
}

impl From<SourceVariant> for CsvLayout {
    fn from(variant: SourceVariant) -> Self {
        match variant {
            SourceVariant::Api => CsvLayout::Grouped,
            SourceVariant::Dom => CsvLayout::Flat,
        }
    }
}

/// Render grouped records as UTF-8 CSV with a byte order mark.
pub fn render_csv(groups: &[DayGroup], layout: CsvLayout) -> Result<Vec<u8>> {
    let mut out = BOM.to_vec();
    match layout {
        CsvLayout::Grouped => {
            for group in groups {
                let mut writer = new_writer();
                writer.write_record([group.weekday.label(), "", "", ""])?;
                writer.write_record(GROUPED_HEADER)?;
                for record in &group.records {
                    writer.write_record(grouped_row(record))?;
                }
                out.extend(finish(writer)?);
                out.extend_from_slice(b"\r\n");
            }
        }
        CsvLayout::Flat => {
            let mut writer = new_writer();
            writer.write_record(FLAT_HEADER)?;
            for group in groups {
                for record in &group.records {
                    writer.write_record(flat_row(record))?;
                }
            }
            out.extend(finish(writer)?);
        }
    }
    Ok(out)
}

fn new_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}

fn grouped_row(record: &LineupRecord) -> [&str; 4] {
    [
        record.date_text.as_str(),
        record.title.as_str(),
        record.image_url.as_str(),
        record.local_image_filename.as_str(),
    ]
}

fn flat_row(record: &LineupRecord) -> [&str; 5] {
    [
        record.weekday.label(),
        record.date_text.as_str(),
        record.title.as_str(),
        record.image_url.as_str(),
        record.local_image_filename.as_str(),
    ]
}
