use std::{fmt, sync::Arc};

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Source of "today" in the host's local calendar.
pub type TodayFn = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Today's date according to the local wall clock.
#[must_use]
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// A chosen day with its time-of-day pinned to local midnight.
///
/// Equality is by `(year, month, day)` only, so two instants on the same day
/// normalize to equal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedDate(NaiveDate);

impl NormalizedDate {
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// 1-based month.
    #[must_use]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    #[must_use]
    pub fn day(self) -> u32 {
        self.0.day()
    }

    #[must_use]
    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// The chosen day as a fresh instant at midnight.
    #[must_use]
    pub fn at_midnight(self) -> NaiveDateTime {
        self.0.and_time(NaiveTime::MIN)
    }

    #[must_use]
    pub fn viewport_month(self) -> ViewportMonth {
        ViewportMonth::containing(self.0)
    }

    #[must_use]
    pub fn is_same_day(self, year: i32, month: u32, day: u32) -> bool {
        self.year() == year && self.month() == month && self.day() == day
    }
}

impl From<NaiveDate> for NormalizedDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<NaiveDateTime> for NormalizedDate {
    fn from(instant: NaiveDateTime) -> Self {
        Self(instant.date())
    }
}

impl fmt::Display for NormalizedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// The `(year, month)` pair currently displayed by a calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewportMonth {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
}

impl ViewportMonth {
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The date of `day` inside this month, if that day exists.
    #[must_use]
    pub fn day(self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    #[must_use]
    pub fn next(self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    #[must_use]
    pub fn previous(self) -> Self {
        if self.month <= 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for ViewportMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
