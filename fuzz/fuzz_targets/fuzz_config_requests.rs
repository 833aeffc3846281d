//! Fuzz target: configuration-surface request parsers
//!
//! Feeds arbitrary bytes to every JSON body parser and verifies:
//! - No panics under arbitrary input
//! - Any accepted schedule converts to a window inside one day
//! - Any accepted network identity satisfies the length rules
//!
//! cargo fuzz run fuzz_config_requests

#![no_main]

use drumcounter::app::commands::AppCommand;
use drumcounter::schedule::{MINUTES_PER_DAY, ScheduleRequest};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(req) = ScheduleRequest::from_json(data) {
        if let Ok(s) = req.validate() {
            assert!(s.start_minute < MINUTES_PER_DAY);
            assert!(s.stop_minute < MINUTES_PER_DAY);
            assert_eq!(ScheduleRequest::from(s), req);
        }
    }

    if let Ok(AppCommand::SetTime { unix_secs }) = AppCommand::set_time_from_json(data) {
        assert!(unix_secs >= 0);
    }

    if let Ok(AppCommand::SetNetworkIdentity(id)) = AppCommand::network_identity_from_json(data) {
        assert!((1..=32).contains(&id.ssid.len()));
        assert!(id.password.is_empty() || (8..=64).contains(&id.password.len()));
    }
});
