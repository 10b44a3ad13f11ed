use bevy_app::{App, Plugin, Update};
use bevy_ecs::schedule::IntoScheduleConfigs;

use crate::{
    calendar_actions::{
        handle_calendar_actions, initialize_added_single_calendars, sync_form_value_changes,
    },
    events::UiEventQueue,
};

/// Bevy plugin driving every [`UiSingleCalendar`](crate::UiSingleCalendar).
///
/// Each frame: new calendars are initialized, form value notifications that
/// arrived since the last frame are reconciled, then queued
/// [`CalendarUiAction`](crate::CalendarUiAction)s are applied.
#[derive(Default)]
pub struct SingleCalendarPlugin;

impl Plugin for SingleCalendarPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<UiEventQueue>().add_systems(
            Update,
            (
                initialize_added_single_calendars,
                sync_form_value_changes,
                handle_calendar_actions,
            )
                .chain(),
        );
    }
}
