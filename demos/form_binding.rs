use bevy_datepick::{
    CalendarUiAction, ExternalValue, SetValueOptions, SingleCalendarConfig, SingleCalendarPlugin,
    UiEventQueue, UiFormControl, UiSingleCalendar, UiSingleCalendarChanged, UiSingleCalendarError,
    bevy_app::{App, PostUpdate},
    bevy_ecs::prelude::*,
    init_logging,
};
use tracing::info;

const CALENDAR_CONFIG: &str = r#"(
    formatter_to_date: Some("DD.MM.YYYY"),
    formatter_from_date: Some("DD.MM.YYYY"),
    disable_after: Some("2024-12-24"),
)"#;

/// Headless form with one date field and a calendar bound to it.
///
/// Picks a few days, rejects a disabled one, then rewrites the field from the
/// "host" side and prints the form value after every frame.
#[derive(Resource, Debug, Clone, Copy)]
struct DemoEntities {
    form: Entity,
    calendar: Entity,
}

fn report_calendar_events(queue: Res<UiEventQueue>) {
    for event in queue.drain_actions::<UiSingleCalendarChanged>() {
        info!(
            calendar = ?event.action.calendar,
            date = %event.action.date,
            formatted = ?event.action.formatted,
            "chosen day changed"
        );
    }

    for event in queue.drain_actions::<UiSingleCalendarError>() {
        info!(calendar = ?event.action.calendar, error = %event.action.error, "calendar error");
    }
}

fn print_form_value(app: &App, entities: DemoEntities) {
    let value = app
        .world()
        .get::<UiFormControl>(entities.form)
        .map(|form| form.0.value())
        .unwrap_or_default();
    let chosen = app
        .world()
        .get::<UiSingleCalendar>(entities.calendar)
        .and_then(|ui_calendar| ui_calendar.calendar.chosen_date());

    match (value, chosen) {
        (ExternalValue::Text(text), Some(chosen)) => {
            println!("form = {text:<12} chosen = {chosen}");
        }
        (other, chosen) => println!("form = {other:?} chosen = {chosen:?}"),
    }
}

fn main() -> Result<(), bevy_datepick::ConfigError> {
    init_logging();

    let config = SingleCalendarConfig::from_ron(CALENDAR_CONFIG)?;

    let mut app = App::new();
    app.add_plugins(SingleCalendarPlugin)
        .add_systems(PostUpdate, report_calendar_events);

    let form_control = UiFormControl::new("15.12.2024");
    let control = form_control.0.clone();
    let form = app.world_mut().spawn(form_control).id();
    let calendar = app
        .world_mut()
        .spawn(UiSingleCalendar::new(&control, config))
        .id();
    let entities = DemoEntities { form, calendar };
    app.insert_resource(entities);

    app.update();
    print_form_value(&app, entities);

    let queue = app.world().resource::<UiEventQueue>().clone();
    for action in [
        CalendarUiAction::PickDay { calendar, day: 20 },
        CalendarUiAction::PickDay { calendar, day: 31 },
        CalendarUiAction::NavigateMonth {
            calendar,
            forward: false,
        },
        CalendarUiAction::PickDay { calendar, day: 30 },
    ] {
        queue.push_typed(calendar, action);
        app.update();
        print_form_value(&app, entities);
    }

    control.set_value("01.02.2025", SetValueOptions::default());
    app.update();
    print_form_value(&app, entities);

    control.set_value("not a date", SetValueOptions::default());
    app.update();
    print_form_value(&app, entities);

    queue.push_typed(calendar, CalendarUiAction::Destroy { calendar });
    app.update();
    info!(listeners = control.listener_count(), "calendar destroyed");

    Ok(())
}
