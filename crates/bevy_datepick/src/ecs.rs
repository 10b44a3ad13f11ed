use bevy_ecs::prelude::*;
use chrono::NaiveDateTime;

use crate::{
    binding::FormControl, calendar::SingleCalendar, config::SingleCalendarConfig,
    error::CalendarError, value::ExternalValue,
};

/// Form value owned by a host entity.
#[derive(Component, Debug, Clone, Default)]
pub struct UiFormControl(pub FormControl);

impl UiFormControl {
    #[must_use]
    pub fn new(value: impl Into<ExternalValue>) -> Self {
        Self(FormControl::new(value))
    }
}

/// Single-date calendar bound to a [`FormControl`].
///
/// Initialized by [`crate::initialize_added_single_calendars`] on the frame it
/// is added. [`CalendarUiAction::Destroy`] keeps the component in the
/// `Destroyed` phase; despawning it also releases the form subscription.
#[derive(Component, Debug)]
pub struct UiSingleCalendar {
    pub calendar: SingleCalendar,
}

impl UiSingleCalendar {
    #[must_use]
    pub fn new(control: &FormControl, config: SingleCalendarConfig) -> Self {
        Self {
            calendar: SingleCalendar::new(control.clone(), config),
        }
    }

    #[must_use]
    pub fn from_calendar(calendar: SingleCalendar) -> Self {
        Self { calendar }
    }
}

/// Calendar commands consumed by [`crate::handle_calendar_actions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarUiAction {
    /// Choose a day of the displayed month.
    PickDay { calendar: Entity, day: u32 },
    /// Show the next or previous month.
    NavigateMonth { calendar: Entity, forward: bool },
    /// Release the calendar's subscription.
    Destroy { calendar: Entity },
}

/// Emitted when a pick changes the chosen day of a [`UiSingleCalendar`].
#[derive(Debug, Clone, PartialEq)]
pub struct UiSingleCalendarChanged {
    pub calendar: Entity,
    pub date: NaiveDateTime,
    pub formatted: ExternalValue,
}

/// Emitted for every recoverable error a [`UiSingleCalendar`] reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSingleCalendarError {
    pub calendar: Entity,
    pub error: CalendarError,
}
