//! Single-date selection state machine.
//!
//! A [`SingleCalendar`] reconciles three things that can each change on their own:
//! the displayed viewport month, the chosen day, and the bound external value.
//!
//! It changes state only through its entry points:
//! - [`SingleCalendar::initialize`] reads the bound value and subscribes to it,
//! - [`SingleCalendar::apply_external_value`] / [`SingleCalendar::process_value_changes`]
//!   follow host writes without writing back,
//! - [`SingleCalendar::pick_day`] chooses a day in the viewport and writes it out,
//! - [`SingleCalendar::destroy`] releases the subscription.
//!
//! Rejected updates are reported to the injected [`ErrorReporter`] and leave the
//! state unchanged.

use std::{fmt, sync::Arc};

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::{
    binding::{BindingHost, SetValueOptions, ValueBinding},
    config::SingleCalendarConfig,
    date::{NormalizedDate, TodayFn, ViewportMonth, local_today},
    error::{CalendarError, ErrorReporter, TracingReporter},
    format::{self, FormatDescriptor},
    value::ExternalValue,
    viewport::{CalendarViewport, MonthViewport},
};

/// Lifecycle phase of a [`SingleCalendar`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CalendarPhase {
    #[default]
    Uninitialized,
    Active,
    Destroyed,
}

/// Emitted once per successful pick.
#[derive(Debug, Clone, PartialEq)]
pub struct ChosenDayChanged {
    /// Fresh copy of the chosen day at midnight.
    pub date: NaiveDateTime,
    /// The value written to the bound host.
    pub formatted: ExternalValue,
}

pub struct SingleCalendar<V: CalendarViewport = MonthViewport> {
    config: SingleCalendarConfig,
    viewport: V,
    binding: ValueBinding,
    phase: CalendarPhase,
    chosen: Option<NormalizedDate>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    today: TodayFn,
    changes: Vec<ChosenDayChanged>,
}

impl SingleCalendar<MonthViewport> {
    /// Calendar over the default [`MonthViewport`], bounded by the config's
    /// `disable_before` / `disable_after`.
    #[must_use]
    pub fn new(host: impl BindingHost, config: SingleCalendarConfig) -> Self {
        let viewport = MonthViewport::default()
            .with_disable_before(config.disable_before)
            .with_disable_after(config.disable_after);
        Self::with_viewport(host, config, viewport)
    }
}

impl<V: CalendarViewport> SingleCalendar<V> {
    #[must_use]
    pub fn with_viewport(host: impl BindingHost, config: SingleCalendarConfig, viewport: V) -> Self {
        Self {
            config,
            viewport,
            binding: ValueBinding::new(Arc::new(host)),
            phase: CalendarPhase::Uninitialized,
            chosen: None,
            reporter: None,
            today: Arc::new(local_today),
            changes: Vec::new(),
        }
    }

    /// Replace the clock used for "today".
    #[must_use]
    pub fn with_today(mut self, today: impl Fn() -> chrono::NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: impl ErrorReporter) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    pub fn set_reporter(&mut self, reporter: Arc<dyn ErrorReporter>) {
        self.reporter = Some(reporter);
    }

    /// `true` while errors still go to the built-in [`TracingReporter`].
    #[must_use]
    pub fn uses_default_reporter(&self) -> bool {
        self.reporter.is_none()
    }

    #[must_use]
    pub fn config(&self) -> &SingleCalendarConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> CalendarPhase {
        self.phase
    }

    #[must_use]
    pub fn chosen_date(&self) -> Option<NormalizedDate> {
        self.chosen
    }

    #[must_use]
    pub fn viewport_month(&self) -> ViewportMonth {
        self.viewport.current_viewport()
    }

    #[must_use]
    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    #[must_use]
    pub fn binding(&self) -> &ValueBinding {
        &self.binding
    }

    fn report(&self, error: CalendarError) {
        match &self.reporter {
            Some(reporter) => reporter.report(&error),
            None => TracingReporter.report(&error),
        }
    }

    /// Uninitialized → Active.
    ///
    /// Fails only when called twice or after [`SingleCalendar::destroy`].
    pub fn initialize(&mut self) -> Result<(), CalendarError> {
        if self.phase != CalendarPhase::Uninitialized {
            return Err(CalendarError::InvalidTransition {
                operation: "initialize",
                phase: self.phase,
            });
        }

        let today = (self.today)();
        let mut viewport = ViewportMonth::containing(today);

        if self.config.start_chosen_today {
            self.binding
                .push(ExternalValue::from(today), SetValueOptions::default());
        }

        let initial = self.binding.current_value();
        if !initial.is_empty() {
            match format::to_date(&initial, &self.config.formatter_to_date) {
                Ok(instant) => self.chosen = Some(NormalizedDate::from(instant)),
                Err(error) => self.report(error.into()),
            }
        }

        if self.config.start_viewport_at_chosen
            && let Some(chosen) = self.chosen
        {
            viewport = chosen.viewport_month();
        }

        self.binding.subscribe()?;
        self.viewport.set_viewport(viewport);
        self.phase = CalendarPhase::Active;

        debug!(
            viewport = %viewport,
            chosen = ?self.chosen.map(|date| date.to_string()),
            "single calendar initialized"
        );
        Ok(())
    }

    /// Follow a host write. Never writes back to the host.
    pub fn apply_external_value(&mut self, raw: &ExternalValue) {
        if self.phase != CalendarPhase::Active {
            trace!(phase = ?self.phase, "ignoring external value outside active phase");
            return;
        }

        match format::to_date(raw, &self.config.formatter_to_date) {
            Ok(instant) => {
                let next = NormalizedDate::from(instant);
                if self.chosen != Some(next) {
                    debug!(chosen = %next, "chosen date follows external value");
                }
                self.chosen = Some(next);
            }
            Err(error) => self.report(error.into()),
        }
    }

    /// Apply every queued host notification in delivery order.
    ///
    /// Returns how many values were applied.
    pub fn process_value_changes(&mut self) -> usize {
        let pending = self.binding.take_pending();
        for value in &pending {
            self.apply_external_value(value);
        }
        pending.len()
    }

    #[must_use]
    pub fn has_pending_value_changes(&self) -> bool {
        self.binding.has_pending()
    }

    /// Choose `day` of the current viewport month.
    ///
    /// Host notifications queued before the pick are applied first.
    pub fn pick_day(&mut self, day: u32) {
        if self.phase != CalendarPhase::Active {
            trace!(phase = ?self.phase, day, "ignoring pick outside active phase");
            return;
        }
        self.process_value_changes();
        if self.config.no_choose {
            trace!(day, "{}", CalendarError::SelectionSuppressed);
            return;
        }

        let month = self.viewport.current_viewport();
        if self.viewport.is_disabled(day) {
            self.report(CalendarError::DaySelectionDisabled {
                year: month.year,
                month: month.month,
                day,
            });
            return;
        }

        let Some(date) = NormalizedDate::from_ymd(month.year, month.month, day) else {
            self.report(CalendarError::DayOutOfRange {
                year: month.year,
                month: month.month,
                day,
            });
            return;
        };

        self.chosen = Some(date);
        let formatted = format::from_date(date, &self.config.formatter_from_date);
        self.binding
            .push(formatted.clone(), SetValueOptions { emit_event: true });

        debug!(chosen = %date, "day picked");
        self.changes.push(ChosenDayChanged {
            date: date.at_midnight(),
            formatted,
        });
    }

    /// Take the notifications emitted since the last call.
    pub fn drain_changes(&mut self) -> Vec<ChosenDayChanged> {
        std::mem::take(&mut self.changes)
    }

    /// Move the viewport one month forward or back. The chosen date is untouched.
    pub fn navigate_month(&mut self, forward: bool) {
        if self.phase != CalendarPhase::Active {
            trace!(phase = ?self.phase, forward, "ignoring navigation outside active phase");
            return;
        }
        self.process_value_changes();

        let current = self.viewport.current_viewport();
        let next = if forward {
            current.next()
        } else {
            current.previous()
        };
        self.viewport.set_viewport(next);
        trace!(viewport = %next, "viewport moved");
    }

    /// `true` iff the chosen date is `day` of the *viewport* month.
    #[must_use]
    pub fn is_chosen(&self, day: u32) -> bool {
        let month = self.viewport.current_viewport();
        self.chosen
            .is_some_and(|chosen| chosen.is_same_day(month.year, month.month, day))
    }

    /// The chosen date in the default external representation.
    #[must_use]
    pub fn current_value(&self) -> Option<ExternalValue> {
        self.chosen
            .map(|date| format::from_date(date, &FormatDescriptor::Absent))
    }

    /// Release the host subscription. Idempotent and valid in every phase.
    pub fn destroy(&mut self) {
        self.binding.unsubscribe();
        if self.phase != CalendarPhase::Destroyed {
            debug!(phase = ?self.phase, "single calendar destroyed");
        }
        self.phase = CalendarPhase::Destroyed;
    }
}

impl<V: CalendarViewport + fmt::Debug> fmt::Debug for SingleCalendar<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleCalendar")
            .field("phase", &self.phase)
            .field("chosen", &self.chosen)
            .field("viewport", &self.viewport)
            .field("binding", &self.binding)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
