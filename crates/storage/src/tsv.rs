//! Tab separated codecs for the hit-level export and the keyword
//! performance result table.

use csv::{ReaderBuilder, Terminator, Trim, WriterBuilder};
use keyword_core::error::{KeywordError, KeywordResult};
use keyword_core::types::{ClickRecord, ResultRow, RESULT_COLUMNS};
use serde::Deserialize;
use tracing::debug;

/// Columns the pipeline reads. Any other column of the export is ignored.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "referrer",
    "ip",
    "user_agent",
    "geo_city",
    "geo_region",
    "geo_country",
    "event_list",
    "product_list",
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHit {
    referrer: String,
    ip: String,
    user_agent: String,
    geo_city: String,
    geo_region: String,
    geo_country: String,
    event_list: String,
    product_list: String,
}

impl From<RawHit> for ClickRecord {
    fn from(raw: RawHit) -> Self {
        let referrer = Some(raw.referrer).filter(|r| !r.trim().is_empty());
        Self {
            ip: raw.ip,
            user_agent: raw.user_agent,
            geo_city: raw.geo_city,
            geo_region: raw.geo_region,
            geo_country: raw.geo_country,
            referrer,
            event_code: parse_event_code(&raw.event_list),
            product_list: raw.product_list,
        }
    }
}

/// A single numeric event code; blank or list-valued cells carry none.
fn parse_event_code(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

/// Decode a hit-level export: UTF-8, tab separated, header row first, rows
/// terminated by `\r`, `\n` or `\r\n`.
///
/// Returns `Ok(None)` when the body holds no table at all (not even a
/// header), which callers treat as missing input.
pub fn read_click_table(body: &[u8]) -> KeywordResult<Option<Vec<ClickRecord>>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .terminator(Terminator::CRLF)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(body);

    let headers = reader
        .headers()
        .map_err(|e| KeywordError::Parse(format!("unreadable header row: {e}")))?
        .clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(KeywordError::Parse(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<RawHit>().enumerate() {
        let raw = row.map_err(|e| KeywordError::Parse(format!("row {}: {e}", line + 1)))?;
        records.push(ClickRecord::from(raw));
    }

    debug!(rows = records.len(), "Decoded hit table");
    Ok(Some(records))
}

/// Finite revenue is written in plain notation with a decimal point,
/// e.g. `290.0`, never in exponent form.
pub fn format_revenue(revenue: f64) -> String {
    let mut text = revenue.to_string();
    if revenue.is_finite() && !text.contains('.') {
        text.push_str(".0");
    }
    text
}

/// Encode the result table with its fixed header. Absent values become
/// empty cells.
pub fn write_result_table(rows: &[ResultRow]) -> KeywordResult<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(RESULT_COLUMNS)
        .map_err(std::io::Error::from)?;
    for row in rows {
        writer
            .write_record([
                row.search_engine.map(|e| e.domain()).unwrap_or_default(),
                row.search_keyword.as_deref().unwrap_or_default(),
                format_revenue(row.revenue).as_str(),
            ])
            .map_err(std::io::Error::from)?;
    }

    writer
        .into_inner()
        .map_err(|e| KeywordError::Io(e.into_error()))
}
