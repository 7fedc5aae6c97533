use chrono::{DateTime, NaiveDate, NaiveDateTime};
use shared::domain::TimeFormat;

pub const INVALID_DATE: &str = "Invalid Date";

/// Renders `M/D/YYYY - <time>` with a 12 or 24 hour clock.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]` (or space separated),
/// and bare dates (midnight). Offsets are kept as given rather than
/// converted to the host zone.
pub fn format_timestamp(ts: &str, mode: TimeFormat) -> String {
    let Some(moment) = parse_timestamp(ts) else {
        return INVALID_DATE.to_string();
    };
    let time = match mode {
        TimeFormat::TwelveHour => moment.format("%-I:%M:%S %p"),
        TimeFormat::TwentyFourHour => moment.format("%H:%M:%S"),
    };
    format!("{} - {time}", moment.format("%-m/%-d/%Y"))
}

pub fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    let ts = ts.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(ts) {
        return Some(with_offset.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .into_iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(ts, pattern).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(ts, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
#[path = "tests/format_tests.rs"]
mod tests;
