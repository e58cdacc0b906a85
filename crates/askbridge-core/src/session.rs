//! Session continuity policy.
//!
//! A conversation stays open while the user keeps interacting. Once the idle
//! gap exceeds the configured timeout the stored conversation id must not be
//! reused — the next query starts a fresh conversation on the backend.

use chrono::{DateTime, Duration, Utc};

/// Return `true` when the stored conversation id must be discarded.
///
/// Resets when no prior interaction exists, or when the elapsed idle time is
/// strictly greater than `timeout`. An idle gap exactly equal to the timeout
/// keeps the conversation alive.
pub fn should_reset(
    last_interaction: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    timeout: Duration,
) -> bool {
    match last_interaction {
        None => true,
        Some(last) => now - last > timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(m: i64) -> Duration {
        Duration::minutes(m)
    }

    #[test]
    fn no_prior_interaction_resets() {
        assert!(should_reset(None, Utc::now(), minutes(60)));
    }

    #[test]
    fn elapsed_equal_to_timeout_keeps_conversation() {
        let now = Utc::now();
        assert!(!should_reset(Some(now - minutes(60)), now, minutes(60)));
    }

    #[test]
    fn elapsed_just_over_timeout_resets() {
        let now = Utc::now();
        let last = now - minutes(60) - Duration::seconds(1);
        assert!(should_reset(Some(last), now, minutes(60)));
    }

    #[test]
    fn recent_interaction_keeps_conversation() {
        let now = Utc::now();
        assert!(!should_reset(Some(now - minutes(5)), now, minutes(60)));
    }

    #[test]
    fn clock_skew_into_the_future_keeps_conversation() {
        // A last_interaction ahead of `now` yields a negative gap — never resets.
        let now = Utc::now();
        assert!(!should_reset(Some(now + minutes(3)), now, minutes(60)));
    }
}
