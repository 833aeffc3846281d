//! Integration tests for the CounterService input → count → rates →
//! rollover → checkpoint pipeline.

use chrono::NaiveTime;
use drumcounter::app::commands::AppCommand;
use drumcounter::app::events::Topic;
use drumcounter::app::ports::{ConfigError, StorageError};
use drumcounter::app::service::CounterService;
use drumcounter::config::SystemConfig;
use drumcounter::datalog::HEADER;
use drumcounter::error::Error;
use drumcounter::persistence::Checkpointer;
use drumcounter::schedule::ScheduleRequest;

use crate::mock_ports::{MockClock, MockLog, MockNvs, Published, Recorder, datetime, last_on};

fn make_service(nvs: &MockNvs) -> (CounterService, Published) {
    let mut svc = CounterService::new(SystemConfig::default(), 1);
    svc.start(nvs, 0);
    let published = Published::default();
    assert!(svc.subscribe(
        &[Topic::Count, Topic::Rate, Topic::Clock],
        Box::new(Recorder(published.clone()))
    ));
    (svc, published)
}

/// One clean press-and-release on channel 0 starting at `at_ms`.
/// Returns the count reported by the confirmed edge, if it was counted.
fn press(svc: &mut CounterService, at_ms: u64, wall: Option<NaiveTime>) -> Option<u32> {
    assert_eq!(svc.observe_input(0, true, at_ms, wall), None);
    let counted = svc.observe_input(0, true, at_ms + 50, wall);
    svc.observe_input(0, false, at_ms + 100, wall);
    svc.observe_input(0, false, at_ms + 150, wall);
    counted
}

fn hm(h: u32, m: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(h, m, 0)
}

fn overnight() -> ScheduleRequest {
    ScheduleRequest {
        enabled: true,
        start_hour: 22,
        start_minute: 0,
        stop_hour: 6,
        stop_minute: 0,
    }
}

// ── Counting ──────────────────────────────────────────────────

#[test]
fn each_press_counts_once_and_publishes() {
    let nvs = MockNvs::new();
    let (mut svc, published) = make_service(&nvs);
    for i in 0..5u32 {
        assert_eq!(press(&mut svc, u64::from(i) * 200, None), Some(i + 1));
    }
    assert_eq!(svc.count(), 5);
    assert_eq!(last_on(&published, Topic::Count).as_deref(), Some("5"));
}

#[test]
fn bounce_shorter_than_debounce_is_ignored() {
    let nvs = MockNvs::new();
    let (mut svc, _) = make_service(&nvs);
    for t in (0..45).step_by(5) {
        svc.observe_input(0, t % 10 == 0, t, None);
    }
    svc.observe_input(0, false, 200, None);
    assert_eq!(svc.count(), 0);
}

#[test]
fn overnight_schedule_gates_edges() {
    let mut nvs = MockNvs::new();
    let (mut svc, _) = make_service(&nvs);
    let mut clock = MockClock::unset();
    svc.handle_command(AppCommand::SetSchedule(overnight()), 0, &mut clock, &mut nvs)
        .unwrap();

    assert_eq!(press(&mut svc, 0, hm(23, 30)), Some(1));
    assert_eq!(press(&mut svc, 1000, hm(12, 0)), None);
    assert_eq!(press(&mut svc, 2000, hm(2, 0)), Some(2));
    assert_eq!(svc.count(), 2);
}

#[test]
fn missing_clock_keeps_counting_and_skips_rollover() {
    let mut nvs = MockNvs::new();
    let (mut svc, published) = make_service(&nvs);
    let mut clock = MockClock::unset();
    svc.handle_command(AppCommand::SetSchedule(overnight()), 0, &mut clock, &mut nvs)
        .unwrap();

    assert_eq!(press(&mut svc, 0, None), Some(1));
    let mut log = MockLog::default();
    svc.tick(61_000, &clock, &mut nvs, &mut log);
    assert_eq!(svc.count(), 1);
    assert!(last_on(&published, Topic::Clock).is_none());
    assert!(log.files.is_empty());
}

// ── Rates ─────────────────────────────────────────────────────

#[test]
fn rate_tick_publishes_two_decimal_pair() {
    let mut nvs = MockNvs::new();
    let (mut svc, published) = make_service(&nvs);
    let clock = MockClock::unset();
    let mut log = MockLog::default();
    press(&mut svc, 0, None);
    svc.tick(1000, &clock, &mut nvs, &mut log);
    // 1 count in 1 s → 60 cpm instantaneous, α = 1/60 → 1.00 cpm.
    assert_eq!(last_on(&published, Topic::Rate).as_deref(), Some("1.00,1.00"));
    let (cpm, cph) = svc.rates();
    assert!(cpm > 0.0 && cph > 0.0);
}

#[test]
fn rate_tick_follows_cadence() {
    let mut nvs = MockNvs::new();
    let (mut svc, published) = make_service(&nvs);
    let clock = MockClock::unset();
    let mut log = MockLog::default();
    svc.tick(500, &clock, &mut nvs, &mut log);
    assert!(last_on(&published, Topic::Rate).is_none());
    svc.tick(1000, &clock, &mut nvs, &mut log);
    assert_eq!(last_on(&published, Topic::Rate).as_deref(), Some("0.00,0.00"));
}

// ── Rollover ──────────────────────────────────────────────────

#[test]
fn day_rollover_resets_count_and_rates() {
    let mut nvs = MockNvs::new();
    let (mut svc, published) = make_service(&nvs);
    let mut clock = MockClock::at(2024, 5, 1, 23, 59, 59);
    let mut log = MockLog::default();

    for i in 0..42u64 {
        press(&mut svc, i * 200, hm(23, 59));
    }
    assert_eq!(svc.count(), 42);

    svc.tick(10_000, &clock, &mut nvs, &mut log);
    let (cpm, _) = svc.rates();
    assert!(cpm > 0.0);
    assert_eq!(svc.count(), 42, "first clock reading only records the day");

    clock.set_to(2024, 5, 2, 0, 0, 1);
    svc.tick(12_000, &clock, &mut nvs, &mut log);

    assert_eq!(svc.count(), 0);
    assert_eq!(svc.rates(), (0.0, 0.0));
    assert_eq!(last_on(&published, Topic::Count).as_deref(), Some("0"));
    assert_eq!(last_on(&published, Topic::Clock).as_deref(), Some("2024-05-02T00:00:01"));

    // The reset was checkpointed immediately.
    let restored = Checkpointer::new(5000).load_at_startup(&nvs, 1);
    assert_eq!(restored.count, 0);
    assert_eq!(restored.last_date, Some(datetime(2024, 5, 2, 0, 0, 0).date()));
}

#[test]
fn rollover_while_powered_off_fires_after_boot() {
    let mut nvs = MockNvs::new();
    let mut log = MockLog::default();
    {
        let (mut svc, _) = make_service(&nvs);
        let clock = MockClock::at(2024, 5, 1, 10, 0, 0);
        for i in 0..3u64 {
            press(&mut svc, i * 200, hm(10, 0));
        }
        svc.tick(1000, &clock, &mut nvs, &mut log);
        svc.tick(6000, &clock, &mut nvs, &mut log);
    }

    let (mut svc, _) = make_service(&nvs);
    assert_eq!(svc.count(), 3);
    let clock = MockClock::at(2024, 5, 3, 8, 0, 0);
    svc.tick(1000, &clock, &mut nvs, &mut log);
    assert_eq!(svc.count(), 0);
}

#[test]
fn clock_moving_back_does_not_reset() {
    let mut nvs = MockNvs::new();
    let (mut svc, _) = make_service(&nvs);
    let mut clock = MockClock::at(2024, 5, 2, 9, 0, 0);
    let mut log = MockLog::default();
    press(&mut svc, 0, hm(9, 0));
    svc.tick(1000, &clock, &mut nvs, &mut log);
    clock.set_to(2024, 5, 1, 23, 0, 0);
    svc.tick(2000, &clock, &mut nvs, &mut log);
    assert_eq!(svc.count(), 1);
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn periodic_checkpoint_respects_save_interval() {
    let mut nvs = MockNvs::new();
    let (mut svc, _) = make_service(&nvs);
    let clock = MockClock::unset();
    let mut log = MockLog::default();
    press(&mut svc, 0, None);

    svc.tick(4999, &clock, &mut nvs, &mut log);
    assert_eq!(nvs.writes, 0);
    svc.tick(5000, &clock, &mut nvs, &mut log);
    assert!(nvs.writes > 0);
}

#[test]
fn forced_checkpoint_survives_crash() {
    let mut nvs = MockNvs::new();
    let (mut svc, _) = make_service(&nvs);
    let mut clock = MockClock::unset();
    let mut log = MockLog::default();
    for i in 0..7u64 {
        press(&mut svc, i * 200, None);
    }
    svc.tick(2000, &clock, &mut nvs, &mut log);
    svc.handle_command(AppCommand::SetSchedule(overnight()), 2100, &mut clock, &mut nvs)
        .unwrap();
    let before = svc.durable_state();

    // Power loss: nothing else is flushed.
    drop(svc);
    let (svc2, _) = make_service(&nvs);
    let after = svc2.durable_state();
    assert_eq!(after.rate.per_minute, before.rate.per_minute);
    assert_eq!(after.rate.per_hour, before.rate.per_hour);
    assert_eq!(after.last_log_count, before.last_log_count);
    assert_eq!(after.network, before.network);
    assert_eq!(svc2.count(), 7);
    assert_eq!(svc2.schedule(), before.schedule);
}

#[test]
fn reboot_measures_rates_from_boot_not_from_saved_anchor() {
    let mut nvs = MockNvs::new();
    let (mut svc, _) = make_service(&nvs);
    let mut clock = MockClock::unset();
    let mut log = MockLog::default();

    // First boot: one rate tick at 1 s, then five presses made durable by a
    // schedule change, which forces a checkpoint.
    svc.tick(1000, &clock, &mut nvs, &mut log);
    for i in 0..5u64 {
        press(&mut svc, 1100 + i * 200, None);
    }
    svc.handle_command(AppCommand::SetSchedule(overnight()), 2200, &mut clock, &mut nvs)
        .unwrap();
    let saved = Checkpointer::new(5000).load_at_startup(&nvs, 0);
    assert_eq!(saved.count, 5);
    drop(svc);

    // Second boot: uptime restarts below the old anchor.
    let mut svc = CounterService::new(SystemConfig::default(), 1);
    svc.start(&nvs, 200);
    assert_eq!(svc.durable_state().rate.last_sample_ms, 200);
    assert_eq!(svc.durable_state().rate.last_sample_count, 5);

    // No presses since boot: the first sample must not invent a rate.
    svc.tick(1200, &clock, &mut nvs, &mut log);
    assert_eq!(svc.rates(), (0.0, 0.0));
}

#[test]
fn reset_is_persisted_immediately() {
    let mut nvs = MockNvs::new();
    let (mut svc, published) = make_service(&nvs);
    let mut clock = MockClock::unset();
    for i in 0..3u64 {
        press(&mut svc, i * 200, None);
    }
    svc.handle_command(AppCommand::ResetCount, 700, &mut clock, &mut nvs)
        .unwrap();
    assert_eq!(svc.count(), 0);
    assert_eq!(last_on(&published, Topic::Rate).as_deref(), Some("0.00,0.00"));

    let restored = Checkpointer::new(5000).load_at_startup(&nvs, 1);
    assert_eq!(restored.count, 0);
    assert_eq!(restored.last_log_count, 0);
}

#[test]
fn storage_failure_is_reported_not_fatal() {
    let mut nvs = MockNvs::new();
    let (mut svc, _) = make_service(&nvs);
    let mut clock = MockClock::unset();
    press(&mut svc, 0, None);
    nvs.fail_writes = true;
    assert_eq!(
        svc.handle_command(AppCommand::ResetCount, 500, &mut clock, &mut nvs),
        Err(Error::Storage(StorageError::IoError))
    );
    assert_eq!(svc.count(), 0);

    // Retried by the periodic checkpoint once storage recovers.
    nvs.fail_writes = false;
    let mut log = MockLog::default();
    svc.tick(5000, &clock, &mut nvs, &mut log);
    let restored = Checkpointer::new(5000).load_at_startup(&nvs, 1);
    assert_eq!(restored.count, 0);
}

#[test]
fn invalid_schedule_is_rejected_without_mutation() {
    let mut nvs = MockNvs::new();
    let (mut svc, _) = make_service(&nvs);
    let mut clock = MockClock::unset();
    let bad = ScheduleRequest {
        stop_minute: 60,
        ..overnight()
    };
    let before = svc.schedule();
    assert!(matches!(
        svc.handle_command(AppCommand::SetSchedule(bad), 0, &mut clock, &mut nvs),
        Err(Error::Config(ConfigError::ValidationFailed(_)))
    ));
    assert_eq!(svc.schedule(), before);
    assert_eq!(nvs.writes, 0);
}

// ── Day log ───────────────────────────────────────────────────

#[test]
fn day_log_writes_header_once_and_skips_idle_intervals() {
    let mut nvs = MockNvs::new();
    let (mut svc, _) = make_service(&nvs);
    let mut clock = MockClock::at(2024, 5, 1, 8, 0, 0);
    let mut log = MockLog::default();

    press(&mut svc, 0, hm(8, 0));
    svc.tick(1000, &clock, &mut nvs, &mut log);

    clock.set_to(2024, 5, 1, 8, 1, 0);
    svc.tick(61_000, &clock, &mut nvs, &mut log);

    // No new counts: nothing logged this interval.
    clock.set_to(2024, 5, 1, 8, 2, 0);
    svc.tick(121_000, &clock, &mut nvs, &mut log);

    press(&mut svc, 121_100, hm(8, 2));
    clock.set_to(2024, 5, 1, 8, 3, 0);
    svc.tick(181_000, &clock, &mut nvs, &mut log);

    let rows = &log.files["2024-05-01"];
    assert_eq!(rows[0], HEADER);
    assert_eq!(rows.iter().filter(|r| r.as_str() == HEADER).count(), 1);
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("2024-05-01T08:00:00,1,"));
    assert!(rows[2].starts_with("2024-05-01T08:03:00,2,"));
}

#[test]
fn day_log_catches_change_right_after_idle_interval() {
    let mut nvs = MockNvs::new();
    let (mut svc, _) = make_service(&nvs);
    let mut clock = MockClock::at(2024, 5, 1, 8, 0, 0);
    let mut log = MockLog::default();

    press(&mut svc, 0, hm(8, 0));
    svc.tick(1000, &clock, &mut nvs, &mut log);

    clock.set_to(2024, 5, 1, 8, 1, 0);
    svc.tick(61_000, &clock, &mut nvs, &mut log);
    assert_eq!(log.files["2024-05-01"].len(), 2);

    press(&mut svc, 61_100, hm(8, 1));
    clock.set_to(2024, 5, 1, 8, 1, 1);
    svc.tick(62_000, &clock, &mut nvs, &mut log);

    let rows = &log.files["2024-05-01"];
    assert_eq!(rows.len(), 3);
    assert!(rows[2].starts_with("2024-05-01T08:01:01,2,"));
}
