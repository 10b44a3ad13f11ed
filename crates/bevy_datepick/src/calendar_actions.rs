use std::sync::Arc;

use bevy_ecs::prelude::*;
use tracing::warn;

use crate::{
    CalendarUiAction, UiSingleCalendar, UiSingleCalendarChanged, UiSingleCalendarError,
    error::{CalendarError, ErrorReporter},
    events::UiEventQueue,
};

/// Reporter that logs and forwards errors as [`UiSingleCalendarError`] events.
#[derive(Debug, Clone)]
pub struct QueueReporter {
    calendar: Entity,
    queue: UiEventQueue,
}

impl QueueReporter {
    #[must_use]
    pub fn new(calendar: Entity, queue: UiEventQueue) -> Self {
        Self { calendar, queue }
    }
}

impl ErrorReporter for QueueReporter {
    fn report(&self, error: &CalendarError) {
        warn!(calendar = ?self.calendar, error = %error, "single calendar rejected an update");
        self.queue.push_typed(
            self.calendar,
            UiSingleCalendarError {
                calendar: self.calendar,
                error: error.clone(),
            },
        );
    }
}

/// Run `Initialize` on calendars added since the last run.
///
/// Calendars still on the default reporter get a [`QueueReporter`]; an injected
/// reporter is kept.
pub fn initialize_added_single_calendars(
    mut calendars: Query<(Entity, &mut UiSingleCalendar), Added<UiSingleCalendar>>,
    queue: Res<UiEventQueue>,
) {
    for (entity, mut ui_calendar) in &mut calendars {
        if ui_calendar.calendar.uses_default_reporter() {
            ui_calendar
                .calendar
                .set_reporter(Arc::new(QueueReporter::new(entity, queue.clone())));
        }

        if let Err(error) = ui_calendar.calendar.initialize() {
            warn!(calendar = ?entity, error = %error, "failed to initialize single calendar");
        }
    }
}

/// Consume [`CalendarUiAction`] entries from [`UiEventQueue`] and apply them.
///
/// Each successful pick is re-emitted as a [`UiSingleCalendarChanged`] event.
pub fn handle_calendar_actions(world: &mut World) {
    let actions = world
        .resource::<UiEventQueue>()
        .drain_actions::<CalendarUiAction>();

    for event in actions {
        match event.action {
            CalendarUiAction::PickDay { calendar, day } => {
                let Some(mut ui_calendar) = world.get_mut::<UiSingleCalendar>(calendar) else {
                    continue;
                };
                ui_calendar.calendar.pick_day(day);
                let changes = ui_calendar.calendar.drain_changes();

                let queue = world.resource::<UiEventQueue>();
                for change in changes {
                    queue.push_typed(
                        calendar,
                        UiSingleCalendarChanged {
                            calendar,
                            date: change.date,
                            formatted: change.formatted,
                        },
                    );
                }
            }

            CalendarUiAction::NavigateMonth { calendar, forward } => {
                if let Some(mut ui_calendar) = world.get_mut::<UiSingleCalendar>(calendar) {
                    ui_calendar.calendar.navigate_month(forward);
                }
            }

            CalendarUiAction::Destroy { calendar } => {
                if let Some(mut ui_calendar) = world.get_mut::<UiSingleCalendar>(calendar) {
                    ui_calendar.calendar.destroy();
                }
            }
        }
    }
}

/// Apply queued form value notifications to every calendar.
pub fn sync_form_value_changes(mut calendars: Query<&mut UiSingleCalendar>) {
    for mut ui_calendar in &mut calendars {
        if ui_calendar.calendar.has_pending_value_changes() {
            ui_calendar.calendar.process_value_changes();
        }
    }
}
