//! Calendar-day value type.
//!
//! Every "once per day" rule in the engine (feed reset, hunger alert,
//! daily reward, step baseline) compares [`Day`] values instead of ad hoc
//! date strings.  On the wire a day is always ISO `YYYY-MM-DD`.

use core::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// A local calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Day(NaiveDate);

impl Day {
    /// Build a day from year/month/day.  `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse an ISO `YYYY-MM-DD` string.
    pub fn parse_iso(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Self)
    }

    /// ISO `YYYY-MM-DD` representation (used as the remote document key).
    pub fn iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The previous calendar day.  Saturates at the minimum representable date.
    pub fn pred(&self) -> Self {
        Self(self.0.checked_sub_days(Days::new(1)).unwrap_or(self.0))
    }

    /// The next calendar day.  Saturates at the maximum representable date.
    pub fn succ(&self) -> Self {
        Self(self.0.checked_add_days(Days::new(1)).unwrap_or(self.0))
    }
}

impl From<NaiveDate> for Day {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
