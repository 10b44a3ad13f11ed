use chrono::{NaiveDate, NaiveTime};

use crate::{
    CalendarError, CalendarPhase, CalendarUiAction, ConversionError, ErrorLog, ExternalValue,
    FormControl, NormalizedDate, SetValueOptions, SingleCalendar, SingleCalendarConfig,
    SingleCalendarPlugin, UiEventQueue, UiFormControl, UiSingleCalendar, UiSingleCalendarChanged,
    UiSingleCalendarError, ViewportMonth,
};
use bevy_app::App;
use bevy_ecs::prelude::*;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

fn iso_config() -> SingleCalendarConfig {
    SingleCalendarConfig::default()
        .with_pattern("YYYY-MM-DD")
        .expect("valid pattern")
}

fn spawn_calendar(app: &mut App, control: &FormControl, config: SingleCalendarConfig) -> Entity {
    let calendar = SingleCalendar::new(control.clone(), config).with_today(|| date(2024, 5, 20));
    app.world_mut()
        .spawn(UiSingleCalendar::from_calendar(calendar))
        .id()
}

fn calendar_app() -> App {
    let mut app = App::new();
    app.add_plugins(SingleCalendarPlugin);
    app
}

fn chosen(app: &App, entity: Entity) -> Option<NormalizedDate> {
    app.world()
        .get::<UiSingleCalendar>(entity)
        .and_then(|ui_calendar| ui_calendar.calendar.chosen_date())
}

#[test]
fn plugin_initializes_added_calendars() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-03-15");
    let entity = spawn_calendar(&mut app, &control, iso_config());

    app.update();

    let ui_calendar = app
        .world()
        .get::<UiSingleCalendar>(entity)
        .expect("calendar component");
    assert_eq!(ui_calendar.calendar.phase(), CalendarPhase::Active);
    assert_eq!(
        ui_calendar.calendar.viewport_month(),
        ViewportMonth::new(2024, 3).expect("valid month")
    );
    assert_eq!(chosen(&app, entity), Some(date(2024, 3, 15).into()));
    assert_eq!(control.listener_count(), 1);
}

#[test]
fn pick_day_action_updates_form_and_emits_one_change() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-03-01");
    let entity = spawn_calendar(&mut app, &control, iso_config());
    app.update();

    app.world()
        .resource::<UiEventQueue>()
        .push_typed(entity, CalendarUiAction::PickDay { calendar: entity, day: 10 });
    app.update();
    app.update();

    let changed = app
        .world()
        .resource::<UiEventQueue>()
        .drain_actions::<UiSingleCalendarChanged>();

    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].entity, entity);
    assert_eq!(
        changed[0].action,
        UiSingleCalendarChanged {
            calendar: entity,
            date: date(2024, 3, 10).and_time(NaiveTime::MIN),
            formatted: ExternalValue::from("2024-03-10"),
        }
    );
    assert_eq!(control.value(), ExternalValue::from("2024-03-10"));
    assert_eq!(chosen(&app, entity), Some(date(2024, 3, 10).into()));
}

#[test]
fn external_writes_are_reconciled_each_frame() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-03-01");
    let entity = spawn_calendar(&mut app, &control, iso_config());
    app.update();

    control.set_value("2024-07-04", SetValueOptions::default());
    app.update();

    assert_eq!(chosen(&app, entity), Some(date(2024, 7, 4).into()));
    assert!(
        app.world()
            .resource::<UiEventQueue>()
            .drain_actions::<UiSingleCalendarChanged>()
            .is_empty()
    );
}

#[test]
fn conversion_failures_surface_as_error_events() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-03-01");
    let entity = spawn_calendar(&mut app, &control, iso_config());
    app.update();

    control.set_value("March 9th", SetValueOptions::default());
    app.update();

    let errors = app
        .world()
        .resource::<UiEventQueue>()
        .drain_actions::<UiSingleCalendarError>();

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].action.error,
        CalendarError::ConversionInvalid(ConversionError::Unparseable {
            input: "March 9th".to_string(),
            pattern: "YYYY-MM-DD".to_string(),
        })
    );
    assert_eq!(chosen(&app, entity), Some(date(2024, 3, 1).into()));
}

#[test]
fn disabled_day_pick_reports_error_and_keeps_selection() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-03-12");
    let entity = spawn_calendar(
        &mut app,
        &control,
        iso_config().with_disable_before(Some(date(2024, 3, 10))),
    );
    app.update();

    app.world()
        .resource::<UiEventQueue>()
        .push_typed(entity, CalendarUiAction::PickDay { calendar: entity, day: 3 });
    app.update();

    let queue = app.world().resource::<UiEventQueue>();
    assert!(queue.drain_actions::<UiSingleCalendarChanged>().is_empty());
    assert_eq!(queue.drain_actions::<UiSingleCalendarError>().len(), 1);
    assert_eq!(control.value(), ExternalValue::from("2024-03-12"));
    assert_eq!(chosen(&app, entity), Some(date(2024, 3, 12).into()));
}

#[test]
fn navigate_then_pick_uses_the_new_viewport_month() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-12-30");
    let entity = spawn_calendar(&mut app, &control, iso_config());
    app.update();

    let queue = app.world().resource::<UiEventQueue>().clone();
    queue.push_typed(
        entity,
        CalendarUiAction::NavigateMonth {
            calendar: entity,
            forward: true,
        },
    );
    queue.push_typed(entity, CalendarUiAction::PickDay { calendar: entity, day: 2 });
    app.update();

    assert_eq!(control.value(), ExternalValue::from("2025-01-02"));
    assert_eq!(chosen(&app, entity), Some(date(2025, 1, 2).into()));
}

#[test]
fn destroy_action_releases_the_form_subscription() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-03-01");
    let entity = spawn_calendar(&mut app, &control, iso_config());
    app.update();

    app.world()
        .resource::<UiEventQueue>()
        .push_typed(entity, CalendarUiAction::Destroy { calendar: entity });
    app.update();

    control.set_value("2024-09-09", SetValueOptions::default());
    app.world()
        .resource::<UiEventQueue>()
        .push_typed(entity, CalendarUiAction::PickDay { calendar: entity, day: 5 });
    app.update();

    let queue = app.world().resource::<UiEventQueue>();
    assert!(queue.drain_actions::<UiSingleCalendarChanged>().is_empty());
    assert!(queue.drain_actions::<UiSingleCalendarError>().is_empty());
    assert_eq!(control.listener_count(), 0);
    assert_eq!(chosen(&app, entity), Some(date(2024, 3, 1).into()));
    assert_eq!(
        app.world()
            .get::<UiSingleCalendar>(entity)
            .map(|ui_calendar| ui_calendar.calendar.phase()),
        Some(CalendarPhase::Destroyed)
    );
}

#[test]
fn start_chosen_today_writes_host_form_control_component() {
    let mut app = calendar_app();
    let form = app
        .world_mut()
        .spawn(UiFormControl::new("1999-01-01"))
        .id();
    let control = app
        .world()
        .get::<UiFormControl>(form)
        .map(|form_control| form_control.0.clone())
        .expect("form control component");
    let entity = spawn_calendar(&mut app, &control, iso_config().with_start_chosen_today(true));

    app.update();

    assert_eq!(chosen(&app, entity), Some(date(2024, 5, 20).into()));
    assert_eq!(
        app.world()
            .get::<UiFormControl>(form)
            .map(|form_control| form_control.0.value()),
        Some(ExternalValue::from(date(2024, 5, 20)))
    );
}

#[test]
fn actions_for_missing_entities_are_ignored() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-03-01");
    let entity = spawn_calendar(&mut app, &control, iso_config());
    app.update();

    app.world_mut().despawn(entity);
    app.world()
        .resource::<UiEventQueue>()
        .push_typed(entity, CalendarUiAction::PickDay { calendar: entity, day: 10 });
    app.update();

    assert!(app.world().resource::<UiEventQueue>().is_empty());
    assert_eq!(control.value(), ExternalValue::from("2024-03-01"));
}

#[test]
fn despawning_a_calendar_releases_the_form_subscription() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-03-01");
    let entity = spawn_calendar(&mut app, &control, iso_config());
    app.update();
    assert_eq!(control.listener_count(), 1);

    app.world_mut().despawn(entity);
    app.update();

    assert_eq!(control.listener_count(), 0);
}

#[test]
fn two_picks_in_one_frame_keep_form_and_selection_in_step() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-03-01");
    let entity = spawn_calendar(&mut app, &control, iso_config());
    app.update();

    let queue = app.world().resource::<UiEventQueue>().clone();
    queue.push_typed(entity, CalendarUiAction::PickDay { calendar: entity, day: 10 });
    queue.push_typed(entity, CalendarUiAction::PickDay { calendar: entity, day: 12 });
    app.update();
    app.update();

    assert_eq!(control.value(), ExternalValue::from("2024-03-12"));
    assert_eq!(chosen(&app, entity), Some(date(2024, 3, 12).into()));
    assert_eq!(queue.drain_actions::<UiSingleCalendarChanged>().len(), 2);
}

#[test]
fn host_write_and_pick_in_one_frame_apply_in_order() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-03-01");
    let entity = spawn_calendar(&mut app, &control, iso_config());
    app.update();

    control.set_value("2024-04-01", SetValueOptions::default());
    app.world()
        .resource::<UiEventQueue>()
        .push_typed(entity, CalendarUiAction::PickDay { calendar: entity, day: 10 });
    app.update();
    app.update();

    assert_eq!(control.value(), ExternalValue::from("2024-03-10"));
    assert_eq!(chosen(&app, entity), Some(date(2024, 3, 10).into()));
}

#[test]
fn injected_reporter_is_kept_by_the_plugin() {
    let mut app = calendar_app();
    let control = FormControl::new("2024-03-12");
    let log = ErrorLog::new();
    let calendar = SingleCalendar::new(
        control.clone(),
        iso_config().with_disable_before(Some(date(2024, 3, 10))),
    )
    .with_today(|| date(2024, 5, 20))
    .with_reporter(log.clone());
    let entity = app
        .world_mut()
        .spawn(UiSingleCalendar::from_calendar(calendar))
        .id();
    app.update();

    app.world()
        .resource::<UiEventQueue>()
        .push_typed(entity, CalendarUiAction::PickDay { calendar: entity, day: 3 });
    app.update();

    assert_eq!(log.len(), 1);
    assert!(
        app.world()
            .resource::<UiEventQueue>()
            .drain_actions::<UiSingleCalendarError>()
            .is_empty()
    );
}
