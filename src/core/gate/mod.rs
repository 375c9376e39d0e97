use crate::core::types::GateDecision;
use chrono::{DateTime, Datelike, FixedOffset, Weekday};

/// Decide whether a batch may be processed at `local_now`.
///
/// The remote operations team is not staffed at weekends, so when `weekend_alert` is on a
/// Saturday or Sunday in the configured offset suppresses the whole batch. The result depends
/// only on the two inputs.
pub fn evaluate(local_now: &DateTime<FixedOffset>, weekend_alert: bool) -> GateDecision {
    if weekend_alert && is_weekend(local_now.weekday()) {
        GateDecision::Suppress
    } else {
        GateDecision::Proceed
    }
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}
