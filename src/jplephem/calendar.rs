//! Calendar date conversion for Julian dates
//!
//! Used when describing segment coverage.

/// Convert Julian day integer to proleptic Gregorian (year, month, day)
pub fn compute_calendar_date(jd_integer: i64) -> (i64, i64, i64) {
    // See the Explanatory Supplement to the Astronomical Almanac 15.11.
    let f = jd_integer + 1401 + (4 * jd_integer + 274277) / 146097 * 3 / 4 - 38;
    let e = 4 * f + 3;
    let g = (e % 1461) / 4;
    let h = 5 * g + 2;
    let day = (h % 153) / 5 + 1;
    let month = (h / 153 + 2) % 12 + 1;
    let year = e / 1461 - 4716 + (12 + 2 - month) / 12;

    (year, month, day)
}

/// Format a Julian date as a calendar date string (YYYY-MM-DD)
///
/// Julian dates start at noon, so the civil day is found from `jd + 0.5`.
pub fn format_date(jd: f64) -> String {
    let (year, month, day) = compute_calendar_date((jd + 0.5).floor() as i64);
    format!("{:04}-{:02}-{:02}", year, month, day)
}
