use chrono::{DateTime, NaiveDate, Utc};

#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[must_use]
pub fn format_date(value: NaiveDate) -> String {
    value.format("%b %-d, %Y").to_string()
}

/// Whole percent, rounded.
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{value:.0}%")
}

/// Share of `part` in `total` as a rounded whole percent; zero when `total` is zero.
#[must_use]
pub fn percent_of(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (part, total) = (u64::from(part), u64::from(total));
    u32::try_from((part * 200 + total) / (2 * total)).unwrap_or(u32::MAX)
}
