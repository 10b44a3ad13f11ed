use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;

use crate::{calendar::CalendarPhase, format::ConversionError, format::PatternError};

/// Recoverable conditions detected by a [`SingleCalendar`](crate::SingleCalendar).
///
/// None of these escape the state machine as a panic; they are delivered to the
/// calendar's [`ErrorReporter`] and the state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// An external value could not be converted into a date.
    #[error("value is not a date: {0}")]
    ConversionInvalid(#[from] ConversionError),

    /// A pick was attempted on a day the viewport marks as disabled.
    #[error("couldn't choose {year:04}-{month:02}-{day:02}: day is disabled")]
    DaySelectionDisabled { year: i32, month: u32, day: u32 },

    /// A pick named a day that does not exist in the viewport month.
    #[error("couldn't choose day {day} in {year:04}-{month:02}: no such day")]
    DayOutOfRange { year: i32, month: u32, day: u32 },

    /// Selection is switched off by configuration. Never reported.
    #[error("selection is disabled for this calendar")]
    SelectionSuppressed,

    /// A lifecycle operation was called in the wrong phase.
    #[error("cannot {operation} a calendar in the {phase:?} phase")]
    InvalidTransition {
        operation: &'static str,
        phase: CalendarPhase,
    },

    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// Misuse of a [`ValueBinding`](crate::ValueBinding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("binding already holds an active subscription")]
    AlreadySubscribed,
}

/// Failure to load a [`SingleCalendarConfig`](crate::SingleCalendarConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid calendar config: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("invalid date pattern in calendar config: {0}")]
    Pattern(#[from] PatternError),
}

/// Error channel injected into a calendar.
pub trait ErrorReporter: Send + Sync + 'static {
    fn report(&self, error: &CalendarError);
}

/// Default reporter: logs every error through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &CalendarError) {
        warn!(error = %error, "single calendar rejected an update");
    }
}

/// Reporter that keeps every error for later inspection.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    errors: Arc<Mutex<Vec<CalendarError>>>,
}

impl ErrorLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<CalendarError> {
        self.errors.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<CalendarError> {
        std::mem::take(&mut *self.errors.lock())
    }
}

impl ErrorReporter for ErrorLog {
    fn report(&self, error: &CalendarError) {
        self.errors.lock().push(error.clone());
    }
}
