use chrono::Utc;

/// Day-granularity date stamp used on loads (`YYYY-MM-DD`, UTC).
///
/// Range queries compare these strings lexically, so the format must stay
/// zero-padded.
pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Unix timestamp in seconds.
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Inclusive lexical range check on `YYYY-MM-DD` strings.
pub fn in_date_range(date: &str, from: &str, to: &str) -> bool {
    date >= from && date <= to
}
