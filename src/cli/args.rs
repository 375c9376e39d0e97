use chrono::{DateTime, FixedOffset};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InvokeArgs {
    /// S3 event notification JSON to replay
    #[arg(long, value_name = "FILE")]
    pub event: PathBuf,

    /// Pretend the run starts at this instant (RFC 3339, e.g. 2024-06-04T10:00:00+09:00)
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_instant)]
    pub now: Option<DateTime<FixedOffset>>,
}

#[derive(Args, Debug)]
pub struct GateArgs {
    /// Instant to evaluate (RFC 3339); defaults to the current time
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_instant)]
    pub now: Option<DateTime<FixedOffset>>,

    /// Override WEEKEND_ALERT for this evaluation
    #[arg(long, value_name = "BOOL")]
    pub weekend_alert: Option<bool>,
}

fn parse_instant(value: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|err| format!("'{}' is not an RFC 3339 timestamp: {}", value, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instant_accepts_offsets() {
        let parsed = parse_instant("2024-06-04T10:00:00+09:00").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_parse_instant_rejects_dates_without_time() {
        assert!(parse_instant("2024-06-04").is_err());
    }
}
