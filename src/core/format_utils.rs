/*
 * Presentation helpers turning raw timestamps and byte counts into the strings the
 * list and detail views display. Dates are rendered in UTC.
 */
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[month]/[day]/[year]");
const DATE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[month]/[day]/[year] [hour]:[minute]:[second]");

fn datetime_from_millis(timestamp_ms: i64) -> Option<OffsetDateTime> {
    let nanos = i128::from(timestamp_ms) * 1_000_000;
    match OffsetDateTime::from_unix_timestamp_nanos(nanos) {
        Ok(datetime) => Some(datetime),
        Err(e) => {
            log::warn!("FormatUtils: Timestamp {timestamp_ms} out of range: {e}");
            None
        }
    }
}

fn format_with(timestamp_ms: i64, format: &[FormatItem<'static>]) -> String {
    datetime_from_millis(timestamp_ms)
        .and_then(|datetime| datetime.format(format).ok())
        .unwrap_or_else(|| "-".to_string())
}

/* "MM/dd/yyyy". Out-of-range timestamps render as "-". */
pub fn format_date(timestamp_ms: i64) -> String {
    format_with(timestamp_ms, DATE_FORMAT)
}

/* "MM/dd/yyyy HH:mm:ss". */
pub fn format_date_time(timestamp_ms: i64) -> String {
    format_with(timestamp_ms, DATE_TIME_FORMAT)
}

/*
 * Human-readable size with 1000-based units, one decimal place above plain bytes
 * ("999 B", "1.5 kB", "12.0 MB").
 */
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["kB", "MB", "GB", "TB", "PB"];
    if bytes < 1000 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    while value >= 999.95 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

pub fn format_optional_size(bytes: Option<u64>) -> String {
    bytes.map(format_size).unwrap_or_else(|| "-".to_string())
}
