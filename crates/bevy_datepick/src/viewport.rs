use std::{fmt, sync::Arc};

use chrono::NaiveDate;

use crate::date::ViewportMonth;

/// Extra host rule for days that cannot be chosen.
pub type DisabledDateFn = Arc<dyn Fn(NaiveDate) -> bool + Send + Sync>;

/// Month-grid capability a calendar is composed with.
///
/// `is_disabled` answers for a day number of the *current* viewport month.
pub trait CalendarViewport: Send + Sync + 'static {
    fn set_viewport(&mut self, month: ViewportMonth);

    fn current_viewport(&self) -> ViewportMonth;

    fn is_disabled(&self, day: u32) -> bool;
}

/// Default viewport with optional `[disable_before, disable_after]` bounds.
///
/// Days missing from the month (`0`, `31` in April, ...) are always disabled.
#[derive(Clone)]
pub struct MonthViewport {
    month: ViewportMonth,
    pub disable_before: Option<NaiveDate>,
    pub disable_after: Option<NaiveDate>,
    pub disabled_dates: Option<DisabledDateFn>,
}

impl MonthViewport {
    #[must_use]
    pub fn new(month: ViewportMonth) -> Self {
        Self {
            month,
            disable_before: None,
            disable_after: None,
            disabled_dates: None,
        }
    }

    #[must_use]
    pub fn with_disable_before(mut self, date: Option<NaiveDate>) -> Self {
        self.disable_before = date;
        self
    }

    #[must_use]
    pub fn with_disable_after(mut self, date: Option<NaiveDate>) -> Self {
        self.disable_after = date;
        self
    }

    #[must_use]
    pub fn with_disabled_dates(
        mut self,
        predicate: impl Fn(NaiveDate) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.disabled_dates = Some(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn is_date_disabled(&self, date: NaiveDate) -> bool {
        self.disable_before.is_some_and(|first| date < first)
            || self.disable_after.is_some_and(|last| date > last)
            || self
                .disabled_dates
                .as_ref()
                .is_some_and(|predicate| predicate(date))
    }
}

impl Default for MonthViewport {
    fn default() -> Self {
        Self::new(ViewportMonth::containing(NaiveDate::default()))
    }
}

impl CalendarViewport for MonthViewport {
    fn set_viewport(&mut self, month: ViewportMonth) {
        self.month = month;
    }

    fn current_viewport(&self) -> ViewportMonth {
        self.month
    }

    fn is_disabled(&self, day: u32) -> bool {
        self.month
            .day(day)
            .is_none_or(|date| self.is_date_disabled(date))
    }
}

impl fmt::Debug for MonthViewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonthViewport")
            .field("month", &self.month)
            .field("disable_before", &self.disable_before)
            .field("disable_after", &self.disable_after)
            .field("disabled_dates", &self.disabled_dates.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
