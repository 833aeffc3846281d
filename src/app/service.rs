//! Application service — the hexagonal core.
//!
//! [`CounterService`] is the single root object that owns all counting
//! state.  It exposes a hardware-agnostic API; storage, wall clock and the
//! append log are injected at call sites, making the whole service testable
//! with mock adapters.
//!
//! ```text
//!  raw levels ──▶ ┌──────────────────────────────────┐ ──▶ Subscribers
//!                 │          CounterService          │
//!  ClockPort ◀──▶ │ Debounce · Gate · Count · Rates  │ ──▶ LogSinkPort
//! StoragePort ◀──▶│ Rollover · Checkpoint · DataLog  │
//!                 └──────────────────────────────────┘
//! ```
//!
//! Field ownership is single-writer: the accumulator owns the count, the
//! estimator owns the rates, the rollover controller owns the last-seen
//! day, and the checkpointer owns the on-flash image.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use log::{info, warn};

use crate::config::{NetworkIdentity, SystemConfig};
use crate::counter::Accumulator;
use crate::datalog::DataLogger;
use crate::drivers::debounce::{DebounceMonitor, Polarity};
use crate::error::{Error, Result};
use crate::persistence::{Checkpointer, DurableState};
use crate::publisher::ChangePublisher;
use crate::rate::RateEstimator;
use crate::rollover::DailyRollover;
use crate::schedule::{Schedule, ScheduleRequest};

use super::commands::{AppCommand, AppResponse};
use super::events::{Topic, clock_payload};
use super::ports::{ClockError, ClockPort, LogSinkPort, StoragePort, Subscriber};

// ───────────────────────────────────────────────────────────────
// CounterService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all counting logic.
pub struct CounterService {
    config: SystemConfig,
    channels: Vec<DebounceMonitor>,
    schedule: Schedule,
    network: NetworkIdentity,
    accumulator: Accumulator,
    rate: RateEstimator,
    rollover: DailyRollover,
    checkpointer: Checkpointer,
    logger: DataLogger,
    publisher: ChangePublisher,
    /// Count at the last successful append-log row.
    last_log_count: u32,
    last_rate_tick_ms: u64,
    last_clock_tick_ms: u64,
}

impl CounterService {
    /// Construct the service with `channels` inputs sharing the configured
    /// polarity.
    ///
    /// Does **not** restore durable state; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, channels: u8) -> Self {
        let polarity = Polarity::from_active_high(config.active_high);
        let debounce = u64::from(config.debounce_ms);
        let channels = (0..channels)
            .map(|ch| DebounceMonitor::new(ch, polarity, debounce))
            .collect();

        Self {
            channels,
            schedule: Schedule::default(),
            network: NetworkIdentity::default(),
            accumulator: Accumulator::new(0),
            rate: RateEstimator::default(),
            rollover: DailyRollover::default(),
            checkpointer: Checkpointer::new(config.save_interval_ms),
            logger: DataLogger::new(config.log_interval_secs),
            publisher: ChangePublisher::new(),
            last_log_count: 0,
            last_rate_tick_ms: 0,
            last_clock_tick_ms: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Restore durable state and anchor the periodic cadences at `now_ms`.
    pub fn start(&mut self, storage: &impl StoragePort, now_ms: u64) {
        let state = self.checkpointer.load_at_startup(storage, now_ms);
        self.accumulator = Accumulator::new(state.count);
        self.rate = RateEstimator::new(state.rate);
        self.last_log_count = state.last_log_count;
        self.schedule = state.schedule;
        self.network = state.network;
        self.rollover = DailyRollover::new(state.last_date);
        self.last_rate_tick_ms = now_ms;
        self.last_clock_tick_ms = now_ms;
        info!(
            "CounterService started: {} channel(s), count={}",
            self.channels.len(),
            state.count
        );
    }

    /// Register an outbound subscriber.  Returns `false` if the list is full.
    pub fn subscribe(&mut self, topics: &[Topic], sink: Box<dyn Subscriber>) -> bool {
        self.publisher.subscribe(topics, sink)
    }

    // ── Input path ────────────────────────────────────────────

    /// Feed one raw sample for `channel`.  Returns the new count when the
    /// sample completed a schedule-permitted edge.
    pub fn observe_input(
        &mut self,
        channel: u8,
        raw: bool,
        now_ms: u64,
        wall: Option<NaiveTime>,
    ) -> Option<u32> {
        let Some(monitor) = self.channels.get_mut(usize::from(channel)) else {
            warn!("observe_input: unknown channel {}", channel);
            return None;
        };
        let edge = monitor.observe(raw, now_ms)?;
        self.accumulator
            .on_edge(edge, &self.schedule, wall, &mut self.publisher)
    }

    // ── Per-loop orchestration ────────────────────────────────

    /// Run every periodic duty that is due at `now_ms`:
    /// clock publish + rollover → rate tick → log row → checkpoint.
    ///
    /// I/O failures are logged and retried on a later call; nothing here is
    /// fatal.
    pub fn tick(
        &mut self,
        now_ms: u64,
        clock: &impl ClockPort,
        storage: &mut impl StoragePort,
        log_sink: &mut impl LogSinkPort,
    ) {
        let wall = clock.now();

        if now_ms.saturating_sub(self.last_clock_tick_ms) >= u64::from(self.config.clock_tick_ms) {
            self.last_clock_tick_ms = now_ms;
            if let Some(wall) = wall {
                if let Some(p) = clock_payload(&wall) {
                    self.publisher.publish(Topic::Clock, &p);
                }
                self.check_rollover(now_ms, wall.date(), storage);
            }
        }

        if now_ms.saturating_sub(self.last_rate_tick_ms) >= u64::from(self.config.rate_tick_ms) {
            self.last_rate_tick_ms = now_ms;
            self.rate
                .tick(now_ms, self.accumulator.count(), &mut self.publisher);
        }

        // Errors are already logged by the logger; the row is retried next interval.
        let _ = self.logger.maybe_log(
            now_ms,
            wall,
            self.accumulator.count(),
            self.rate.rates(),
            &mut self.last_log_count,
            log_sink,
        );

        let state = self.durable_state();
        let _ = self.checkpointer.maybe_checkpoint(now_ms, &state, storage);
    }

    /// Reset everything if `today` is past the last seen day.  Returns `true`
    /// when a rollover reset happened.
    pub fn check_rollover(
        &mut self,
        now_ms: u64,
        today: NaiveDate,
        storage: &mut impl StoragePort,
    ) -> bool {
        if !self.rollover.check(today) {
            return false;
        }
        info!("Daily rollover at count={}", self.accumulator.count());
        if let Err(e) = self.reset(now_ms, storage) {
            warn!("Rollover checkpoint failed: {}", e);
        }
        true
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a configuration-surface request.
    ///
    /// Invalid requests are rejected before any state changes.  Mutating
    /// commands are persisted before returning; a storage failure is
    /// reported but the in-memory change stands and is retried by the
    /// periodic checkpoint.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u64,
        clock: &mut impl ClockPort,
        storage: &mut impl StoragePort,
    ) -> Result<AppResponse> {
        match cmd {
            AppCommand::GetCount => Ok(AppResponse::Count(self.count())),
            AppCommand::GetRates => {
                let (per_minute, per_hour) = self.rate.rates();
                Ok(AppResponse::Rates {
                    per_minute,
                    per_hour,
                })
            }
            AppCommand::GetSchedule => Ok(AppResponse::Schedule(ScheduleRequest::from(
                self.schedule,
            ))),
            AppCommand::ResetCount => {
                info!("Count reset requested");
                self.reset(now_ms, storage)?;
                Ok(AppResponse::Done)
            }
            AppCommand::SetSchedule(req) => {
                let schedule = req.validate()?;
                self.schedule = schedule;
                info!("Schedule updated: {:?}", schedule);
                self.persist_now(now_ms, storage)?;
                Ok(AppResponse::Done)
            }
            AppCommand::SetNetworkIdentity(id) => {
                info!("Network identity updated: ssid='{}'", id.ssid);
                self.network = id;
                self.persist_now(now_ms, storage)?;
                Ok(AppResponse::Done)
            }
            AppCommand::SetTime { unix_secs } => {
                let local = self.local_from_unix(unix_secs)?;
                clock.set(local)?;
                // Re-anchor so the jump does not produce a bogus rate sample.
                self.rate.rebaseline(now_ms, self.accumulator.count());
                if let Some(p) = clock_payload(&local) {
                    self.publisher.publish(Topic::Clock, &p);
                }
                info!("Wall clock set to {}", local);
                Ok(AppResponse::Done)
            }
        }
    }

    /// Zero count, rates and last-logged count, then checkpoint immediately.
    pub fn reset(&mut self, now_ms: u64, storage: &mut impl StoragePort) -> Result<()> {
        self.accumulator.reset(&mut self.publisher);
        self.rate.reset(now_ms, 0, &mut self.publisher);
        self.last_log_count = 0;
        self.persist_now(now_ms, storage)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn count(&self) -> u32 {
        self.accumulator.count()
    }

    /// `(counts per minute, counts per hour)`
    pub fn rates(&self) -> (f64, f64) {
        self.rate.rates()
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn network_identity(&self) -> &NetworkIdentity {
        &self.network
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Consistent snapshot of everything the checkpointer persists.
    pub fn durable_state(&self) -> DurableState {
        DurableState {
            count: self.accumulator.count(),
            rate: self.rate.state(),
            last_log_count: self.last_log_count,
            schedule: self.schedule,
            network: self.network.clone(),
            last_date: self.rollover.last_seen(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn persist_now(&mut self, now_ms: u64, storage: &mut impl StoragePort) -> Result<()> {
        let state = self.durable_state();
        self.checkpointer.force_checkpoint(now_ms, &state, storage)
    }

    /// Convert UTC unix seconds to local wall time.
    fn local_from_unix(&self, unix_secs: i64) -> Result<NaiveDateTime> {
        let local = unix_secs
            .checked_add(i64::from(self.config.utc_offset_secs))
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or(Error::Clock(ClockError::OutOfRange))?;
        Ok(local.naive_utc())
    }
}
