//! Input drivers: debounced counting switches.

pub mod debounce;
pub mod switch;
