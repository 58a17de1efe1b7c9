#![forbid(unsafe_code)]

//! Mapping monotonic instants to wall-clock time.
//!
//! Engine logic only ever compares [`Instant`]s. Wall-clock time appears in
//! log lines and export documents, and is derived from one fixed pairing of a
//! monotonic origin with a UTC origin so output stays deterministic in tests.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use web_time::Instant;

/// Pairs a monotonic origin with the wall-clock time it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    origin: Instant,
    wall_origin: DateTime<Utc>,
}

impl SessionClock {
    #[must_use]
    pub const fn new(origin: Instant, wall_origin: DateTime<Utc>) -> Self {
        Self {
            origin,
            wall_origin,
        }
    }

    /// A clock anchored at the current instant and the current UTC time.
    #[must_use]
    pub fn start() -> Self {
        Self::new(Instant::now(), Utc::now())
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Wall-clock time of `at`. Instants before the origin clamp to it.
    #[must_use]
    pub fn wall(&self, at: Instant) -> DateTime<Utc> {
        let since = at.saturating_duration_since(self.origin);
        let delta = TimeDelta::from_std(since).unwrap_or(TimeDelta::MAX);
        self.wall_origin
            .checked_add_signed(delta)
            .unwrap_or(self.wall_origin)
    }

    /// Milliseconds since the origin.
    #[must_use]
    pub fn millis(&self, at: Instant) -> u64 {
        u64::try_from(at.saturating_duration_since(self.origin).as_millis()).unwrap_or(u64::MAX)
    }

    /// `HH:MM:SS.mmm` for log lines.
    #[must_use]
    pub fn log_stamp(&self, at: Instant) -> String {
        self.wall(at).format("%H:%M:%S%.3f").to_string()
    }

    /// RFC 3339 with millisecond precision for export documents.
    #[must_use]
    pub fn rfc3339(&self, at: Instant) -> String {
        self.wall(at).to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use web_time::Duration;

    fn clock() -> (SessionClock, Instant) {
        let t = Instant::now();
        let wall = Utc
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .single()
            .expect("valid date");
        (SessionClock::new(t, wall), t)
    }

    #[test]
    fn log_stamp_has_millis() {
        let (c, t) = clock();
        assert_eq!(c.log_stamp(t), "14:05:07.000");
        assert_eq!(c.log_stamp(t + Duration::from_millis(1234)), "14:05:08.234");
    }

    #[test]
    fn rfc3339_is_utc() {
        let (c, t) = clock();
        assert_eq!(c.rfc3339(t + Duration::from_millis(5)), "2024-03-09T14:05:07.005Z");
    }

    #[test]
    fn millis_since_origin() {
        let (c, t) = clock();
        assert_eq!(c.millis(t + Duration::from_millis(750)), 750);
        assert_eq!(c.millis(t), 0);
    }
}
