//! In-memory sliding-window rate limiter.
//!
//! Two windows per identifier (one minute, one hour). Timestamps are pruned
//! on every check, so memory stays proportional to recent traffic.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Allowed,
    /// Which window tripped, for the 429 message.
    Denied { window: &'static str },
}

#[derive(Default)]
struct Windows {
    minute: VecDeque<Instant>,
    hour: VecDeque<Instant>,
}

impl Windows {
    fn prune(&mut self, now: Instant) {
        while self
            .minute
            .front()
            .is_some_and(|t| now.duration_since(*t) > MINUTE)
        {
            self.minute.pop_front();
        }
        while self
            .hour
            .front()
            .is_some_and(|t| now.duration_since(*t) > HOUR)
        {
            self.hour.pop_front();
        }
    }
}

pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, Windows>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Check and record a hit for `identifier`. Denied hits are not
    /// recorded, so a throttled client does not push its own window out.
    pub fn check(&self, identifier: &str) -> Decision {
        self.check_at(identifier, Instant::now())
    }

    fn check_at(&self, identifier: &str, now: Instant) -> Decision {
        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");
        let windows = buckets.entry(identifier.to_string()).or_default();
        windows.prune(now);

        if windows.minute.len() >= self.config.requests_per_minute {
            return Decision::Denied { window: "minute" };
        }
        if windows.hour.len() >= self.config.requests_per_hour {
            return Decision::Denied { window: "hour" };
        }

        windows.minute.push_back(now);
        windows.hour.push_back(now);
        Decision::Allowed
    }

    /// Remaining budget in both windows, for response headers.
    pub fn remaining(&self, identifier: &str) -> (usize, usize) {
        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");
        let windows = buckets.entry(identifier.to_string()).or_default();
        windows.prune(Instant::now());
        (
            self.config.requests_per_minute.saturating_sub(windows.minute.len()),
            self.config.requests_per_hour.saturating_sub(windows.hour.len()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(per_minute: usize, per_hour: usize) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            requests_per_minute: per_minute,
            requests_per_hour: per_hour,
        })
    }

    #[test]
    fn allows_up_to_minute_limit_then_denies() {
        let limiter = limiter(3, 100);
        for _ in 0..3 {
            assert_eq!(limiter.check("user:1"), Decision::Allowed);
        }
        assert_eq!(
            limiter.check("user:1"),
            Decision::Denied { window: "minute" }
        );
    }

    #[test]
    fn identifiers_are_independent() {
        let limiter = limiter(1, 100);
        assert_eq!(limiter.check("user:1"), Decision::Allowed);
        assert_eq!(limiter.check("user:2"), Decision::Allowed);
        assert!(matches!(limiter.check("user:1"), Decision::Denied { .. }));
    }

    #[test]
    fn hour_window_trips_independently() {
        let limiter = limiter(100, 2);
        assert_eq!(limiter.check("k"), Decision::Allowed);
        assert_eq!(limiter.check("k"), Decision::Allowed);
        assert_eq!(limiter.check("k"), Decision::Denied { window: "hour" });
    }

    #[test]
    fn minute_window_slides() {
        let limiter = limiter(2, 100);
        let start = Instant::now();
        assert_eq!(limiter.check_at("k", start), Decision::Allowed);
        assert_eq!(limiter.check_at("k", start), Decision::Allowed);
        assert!(matches!(
            limiter.check_at("k", start),
            Decision::Denied { .. }
        ));

        // 61 seconds later the minute window has drained.
        let later = start + Duration::from_secs(61);
        assert_eq!(limiter.check_at("k", later), Decision::Allowed);
    }

    #[test]
    fn denied_hits_are_not_recorded() {
        let limiter = limiter(1, 100);
        let start = Instant::now();
        assert_eq!(limiter.check_at("k", start), Decision::Allowed);
        for _ in 0..10 {
            limiter.check_at("k", start);
        }
        let (minute_left, _) = limiter.remaining("k");
        assert_eq!(minute_left, 0);

        // Only the single allowed hit occupies the window.
        let later = start + Duration::from_secs(61);
        assert_eq!(limiter.check_at("k", later), Decision::Allowed);
    }

    #[test]
    fn remaining_reports_both_windows() {
        let limiter = limiter(5, 10);
        limiter.check("k");
        limiter.check("k");
        assert_eq!(limiter.remaining("k"), (3, 8));
    }
}
