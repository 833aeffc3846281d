//! GPIO assignments for the DrumCounter board.
//!
//! Single source of truth; the binary references this module rather than
//! hard-coding pin numbers.

/// Counting switch inputs, one per channel, in channel order.
/// Pulled down when the switch is active-high, up when active-low.
pub const SWITCH_GPIOS: [i32; 2] = [26, 27];

/// Main loop period.  Must stay well below the debounce interval so every
/// switch level is sampled several times before it is accepted.
pub const LOOP_PERIOD_MS: u32 = 10;
