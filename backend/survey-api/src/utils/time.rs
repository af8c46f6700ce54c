use chrono::{DateTime, Utc};

/// Milliseconds from `start` to `at`, clamped at zero for clock skew.
pub fn elapsed_millis(start: DateTime<Utc>, at: DateTime<Utc>) -> u64 {
    (at - start).num_milliseconds().max(0) as u64
}

pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Seconds with two-decimal precision.
pub fn millis_to_seconds(millis: u64) -> f64 {
    round_hundredths(millis as f64 / 1000.0)
}
