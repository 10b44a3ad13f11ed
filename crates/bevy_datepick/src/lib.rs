//! Single-date calendar selection bound to an external form value.
//!
//! `bevy_datepick` keeps three pieces of state consistent:
//! - the viewport month a calendar grid displays,
//! - the chosen day, always normalized to midnight,
//! - the bound form value, which the host may rewrite at any time.
//!
//! Values cross the boundary through a [`FormatDescriptor`]: a token pattern such as
//! `DD.MM.YYYY`, host conversion functions, or nothing at all (native dates).
//!
//! # Minimal setup
//!
//! ```no_run
//! use bevy_datepick::{
//!     CalendarUiAction, FormControl, SingleCalendarConfig, SingleCalendarPlugin,
//!     UiEventQueue, UiSingleCalendar, UiSingleCalendarChanged,
//!     bevy_app::App,
//! };
//!
//! let control = FormControl::new("2024-03-15");
//! let config = SingleCalendarConfig::default()
//!     .with_pattern("YYYY-MM-DD")
//!     .unwrap();
//!
//! let mut app = App::new();
//! app.add_plugins(SingleCalendarPlugin);
//! let calendar = app
//!     .world_mut()
//!     .spawn(UiSingleCalendar::new(&control, config))
//!     .id();
//! app.update();
//!
//! app.world()
//!     .resource::<UiEventQueue>()
//!     .push_typed(calendar, CalendarUiAction::PickDay { calendar, day: 20 });
//! app.update();
//!
//! let changed = app
//!     .world()
//!     .resource::<UiEventQueue>()
//!     .drain_actions::<UiSingleCalendarChanged>();
//! assert_eq!(changed.len(), 1);
//! ```
#![forbid(unsafe_code)]

pub mod binding;
pub mod calendar;
pub mod calendar_actions;
pub mod config;
pub mod date;
pub mod ecs;
pub mod error;
pub mod events;
pub mod format;
pub mod logging;
pub mod plugin;
pub mod value;
pub mod viewport;

pub use bevy_app;
pub use bevy_ecs;
pub use chrono;

pub use binding::*;
pub use calendar::*;
pub use calendar_actions::*;
pub use config::*;
pub use date::*;
pub use ecs::*;
pub use error::*;
pub use events::*;
pub use format::{
    ConversionError, CustomFormatter, DatePattern, FormatDescriptor, FromDateFn, PatternError,
    ToDateFn, from_date, to_date,
};
pub use logging::*;
pub use plugin::*;
pub use value::*;
pub use viewport::*;

pub mod prelude {
    //! Convenience exports for hosting `bevy_datepick` calendars.

    pub use crate::{
        CalendarPhase, CalendarUiAction, CalendarViewport, ChosenDayChanged, CustomFormatter,
        DatePattern, ErrorLog, ErrorReporter, ExternalValue, FormControl, FormatDescriptor,
        MonthViewport, NormalizedDate, SetValueOptions, SingleCalendar, SingleCalendarConfig,
        SingleCalendarPlugin, UiEventQueue, UiFormControl, UiSingleCalendar,
        UiSingleCalendarChanged, UiSingleCalendarError, ViewportMonth, init_logging,
    };

    pub use crate::{bevy_app, bevy_ecs, chrono};
}

#[cfg(test)]
mod tests;
