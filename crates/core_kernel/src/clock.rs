//! Business clock
//!
//! Warranty expiry is a calendar-date rule, so "today" has to be computed in
//! the time zone the business operates in rather than in UTC. Services take
//! an `Arc<dyn Clock>` so tests can pin the date.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use std::sync::RwLock;

use crate::error::CoreError;

/// Source of the current instant and the business-local calendar date
pub trait Clock: Send + Sync + 'static {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Time zone that defines the calendar date
    fn timezone(&self) -> Tz;

    /// Calendar date of `now()` in the business time zone
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.timezone()).date_naive()
    }
}

/// Wall clock in a fixed business time zone
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Builds a clock from an IANA zone name such as `Asia/Kuala_Lumpur`
    pub fn from_zone_name(name: &str) -> Result<Self, CoreError> {
        Tz::from_str(name)
            .map(Self::new)
            .map_err(|_| CoreError::configuration(format!("unknown time zone '{}'", name)))
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

/// Manually driven clock for tests
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
    tz: Tz,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
            tz: chrono_tz::UTC,
        }
    }

    /// Clock pinned to noon UTC on the given date
    pub fn on(date: NaiveDate) -> Self {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
        Self::new(Utc.from_utc_datetime(&date.and_time(noon)))
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn set_date(&self, date: NaiveDate) {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
        self.set(Utc.from_utc_datetime(&date.and_time(noon)));
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}
