//! DrumCounter Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SwitchInput ×N    LogSubscriber   NvsAdapter   Esp32Time      │
//! │  (raw levels)      (Subscriber)    (Config+NVS) (ClockPort)    │
//! │  FileLogSink                                                   │
//! │  (LogSinkPort)                                                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            CounterService (pure logic)                 │    │
//! │  │  Debounce · Gate · Count · Rates · Rollover · Persist  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyInputPin, Input, InputPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use log::{info, warn};

use drumcounter::adapters::file_log::{FileLogSink, SD_MOUNT_POINT};
use drumcounter::adapters::log_sink::LogSubscriber;
use drumcounter::adapters::nvs::NvsAdapter;
use drumcounter::adapters::time::Esp32TimeAdapter;
use drumcounter::app::events::Topic;
use drumcounter::app::ports::{ClockPort, ConfigPort};
use drumcounter::app::service::CounterService;
use drumcounter::config::SystemConfig;
use drumcounter::drivers::switch::SwitchInput;
use drumcounter::error::Error;
use drumcounter::pins;

type Switch = SwitchInput<PinDriver<'static, AnyInputPin, Input>>;

fn switch(pin: AnyInputPin, channel: u8, pull: Pull) -> Result<Switch> {
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(pull)?;
    Ok(SwitchInput::new(driver, channel))
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  DrumCounter v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    // Without NVS the count cannot survive a reboot; refuse to run.
    let mut nvs = NvsAdapter::new().map_err(Error::Config)?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Switch inputs ──────────────────────────────────────
    let peripherals = Peripherals::take().map_err(|_| Error::Init("peripherals already taken"))?;
    let pull = if config.active_high { Pull::Down } else { Pull::Up };
    let mut switches: Vec<Switch> = vec![
        switch(peripherals.pins.gpio26.downgrade_input(), 0, pull)?,
        switch(peripherals.pins.gpio27.downgrade_input(), 1, pull)?,
    ];
    info!(
        "Switches on GPIO {:?}, active-{}",
        pins::SWITCH_GPIOS,
        if config.active_high { "high" } else { "low" }
    );

    // ── 4. Adapters ───────────────────────────────────────────
    let time = Esp32TimeAdapter::new(config.utc_offset_secs);
    let mut sd = FileLogSink::new(SD_MOUNT_POINT);
    if !sd.root().is_dir() {
        warn!("SD card not mounted at {}, day logging disabled", SD_MOUNT_POINT);
    }
    if time.now().is_none() {
        warn!("Wall clock not set: schedule gate open, rollover paused");
    }

    // ── 5. Counter service ────────────────────────────────────
    let mut svc = CounterService::new(config, switches.len() as u8);
    svc.start(&nvs, time.uptime_ms());
    svc.subscribe(&[Topic::Count, Topic::Rate, Topic::Clock], Box::new(LogSubscriber::new()));

    info!(
        "System ready (AP '{}'). Entering control loop.",
        svc.network_identity().ssid
    );

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        let now_ms = time.uptime_ms();
        let wall = time.now();

        for sw in switches.iter_mut() {
            if let Some(level) = sw.read_level() {
                svc.observe_input(sw.channel(), level, now_ms, wall.map(|w| w.time()));
            }
        }

        svc.tick(now_ms, &time, &mut nvs, &mut sd);

        FreeRtos::delay_ms(pins::LOOP_PERIOD_MS);
    }
}
