//! Time source for the workflow and the fixed-offset helpers built on it.

use chrono::{DateTime, FixedOffset, Utc};

/// Supplies the current instant. Injected so tests can pin the weekday.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn new<Tz: chrono::TimeZone>(instant: DateTime<Tz>) -> Self {
        Self(instant.with_timezone(&Utc))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Short label for an offset: `JST` for +9, `UTC` for zero, `UTC+05` style otherwise.
pub fn zone_label(offset: &FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    if seconds == 9 * 3600 {
        return "JST".to_string();
    }
    if seconds == 0 {
        return "UTC".to_string();
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let hours = seconds.abs() / 3600;
    let minutes = (seconds.abs() % 3600) / 60;
    if minutes == 0 {
        format!("UTC{}{:02}", sign, hours)
    } else {
        format!("UTC{}{:02}{:02}", sign, hours, minutes)
    }
}

/// Per-run log stream name, e.g. `run-20240604-100000-JST`.
pub fn run_stream_name(local_now: &DateTime<FixedOffset>) -> String {
    format!(
        "run-{}-{}",
        local_now.format("%Y%m%d-%H%M%S"),
        zone_label(local_now.offset())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_name_in_jst() {
        let now = DateTime::parse_from_rfc3339("2024-06-04T10:00:00+09:00").unwrap();
        assert_eq!(run_stream_name(&now), "run-20240604-100000-JST");
    }

    #[test]
    fn test_zone_labels() {
        assert_eq!(zone_label(&FixedOffset::east_opt(0).unwrap()), "UTC");
        assert_eq!(zone_label(&FixedOffset::west_opt(5 * 3600).unwrap()), "UTC-05");
        assert_eq!(
            zone_label(&FixedOffset::east_opt(5 * 3600 + 1800).unwrap()),
            "UTC+0530"
        );
    }

    #[test]
    fn test_fixed_clock_normalizes_to_utc() {
        let local = DateTime::parse_from_rfc3339("2024-06-04T01:30:00+09:00").unwrap();
        let clock = FixedClock::new(local);
        assert_eq!(clock.now().to_rfc3339(), "2024-06-03T16:30:00+00:00");
    }
}
