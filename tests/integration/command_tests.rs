//! Configuration-surface commands end to end: JSON body → AppCommand →
//! CounterService → response body / persisted state.

use drumcounter::app::commands::{AppCommand, AppResponse};
use drumcounter::app::events::Topic;
use drumcounter::app::ports::ConfigError;
use drumcounter::app::service::CounterService;
use drumcounter::config::{DEFAULT_AP_SSID, SystemConfig};
use drumcounter::persistence::Checkpointer;

use crate::mock_ports::{MockClock, MockNvs, Published, Recorder, datetime, last_on};

fn started(nvs: &MockNvs) -> CounterService {
    let mut svc = CounterService::new(SystemConfig::default(), 1);
    svc.start(nvs, 0);
    svc
}

#[test]
fn get_count_and_rates_bodies() {
    let mut nvs = MockNvs::new();
    let mut svc = started(&nvs);
    let mut clock = MockClock::unset();

    let count = svc
        .handle_command(AppCommand::GetCount, 0, &mut clock, &mut nvs)
        .unwrap();
    assert_eq!(count.to_body(), "0");

    let rates = svc
        .handle_command(AppCommand::GetRates, 0, &mut clock, &mut nvs)
        .unwrap();
    assert_eq!(rates.to_body(), "0.00,0.00");
}

#[test]
fn schedule_set_then_get_round_trips() {
    let mut nvs = MockNvs::new();
    let mut svc = started(&nvs);
    let mut clock = MockClock::unset();
    let body = br#"{"enabled":true,"startHour":22,"startMinute":30,"stopHour":6,"stopMinute":15}"#;

    let cmd = AppCommand::set_schedule_from_json(body).unwrap();
    assert_eq!(
        svc.handle_command(cmd, 10, &mut clock, &mut nvs).unwrap(),
        AppResponse::Done
    );

    let AppResponse::Schedule(got) = svc
        .handle_command(AppCommand::GetSchedule, 20, &mut clock, &mut nvs)
        .unwrap()
    else {
        panic!("expected schedule response");
    };
    assert_eq!((got.start_hour, got.start_minute), (22, 30));
    assert_eq!((got.stop_hour, got.stop_minute), (6, 15));
    assert!(got.enabled);

    let restored = Checkpointer::new(5000).load_at_startup(&nvs, 1);
    assert_eq!(restored.schedule, svc.schedule());
}

#[test]
fn malformed_bodies_never_reach_the_service() {
    assert_eq!(
        AppCommand::set_schedule_from_json(b"not json"),
        Err(ConfigError::Malformed)
    );
    assert_eq!(
        AppCommand::set_time_from_json(br#"{"time":"noon"}"#),
        Err(ConfigError::Malformed)
    );
}

#[test]
fn set_time_applies_offset_and_rebaselines_rates() {
    let mut nvs = MockNvs::new();
    let mut svc = started(&nvs);
    let published = Published::default();
    svc.subscribe(&[Topic::Clock], Box::new(Recorder(published.clone())));
    let mut clock = MockClock::unset();

    // 2024-05-01T01:00:00Z → 08:00 local at GMT+7.
    let cmd = AppCommand::set_time_from_json(br#"{"time":1714525200}"#).unwrap();
    svc.handle_command(cmd, 42_000, &mut clock, &mut nvs).unwrap();

    assert_eq!(clock.sets, vec![datetime(2024, 5, 1, 8, 0, 0)]);
    assert_eq!(svc.durable_state().rate.last_sample_ms, 42_000);
    assert_eq!(last_on(&published, Topic::Clock).as_deref(), Some("2024-05-01T08:00:00"));
}

#[test]
fn network_identity_is_validated_and_persisted() {
    let mut nvs = MockNvs::new();
    let mut svc = started(&nvs);
    let mut clock = MockClock::unset();
    assert_eq!(svc.network_identity().ssid.as_str(), DEFAULT_AP_SSID);

    assert!(AppCommand::network_identity_from_json(br#"{"ssid":"Line 3","password":"abc"}"#).is_err());

    let cmd =
        AppCommand::network_identity_from_json(br#"{"ssid":"Line 3","password":"drums-2024"}"#)
            .unwrap();
    svc.handle_command(cmd, 5, &mut clock, &mut nvs).unwrap();

    let svc2 = started(&nvs);
    assert_eq!(svc2.network_identity().ssid.as_str(), "Line 3");
    assert_eq!(svc2.network_identity().password.as_str(), "drums-2024");
}
