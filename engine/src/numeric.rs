//! FILENAME: engine/src/numeric.rs
//! PURPOSE: The numeric provider consumed by the value system.
//! CONTEXT: Cell numbers are IEEE binary64. This module is the one place
//! that knows about the provider-level operations the engine needs beyond
//! plain arithmetic: the rounding mode, integral rounding under that mode,
//! strict string parsing, and display formatting. The mode lives in a
//! thread-local cell; the engine is single-threaded and tests stay
//! isolated from each other.

use std::cell::Cell;

/// Recognized rounding modes, in their numeric encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMode {
    ToNearest = 0,
    TowardZero = 1,
    Upward = 2,
    Downward = 3,
    FromZero = 4,
}

impl RoundMode {
    /// Maps the numeric encoding back to a mode. Only exact integral
    /// values in range are accepted.
    pub fn from_value(value: f64) -> Option<RoundMode> {
        if value.fract() != 0.0 {
            return None;
        }
        match value as i64 {
            0 => Some(RoundMode::ToNearest),
            1 => Some(RoundMode::TowardZero),
            2 => Some(RoundMode::Upward),
            3 => Some(RoundMode::Downward),
            4 => Some(RoundMode::FromZero),
            _ => None,
        }
    }
}

thread_local! {
    static ROUND_MODE: Cell<RoundMode> = const { Cell::new(RoundMode::ToNearest) };
}

pub fn get_round_mode() -> RoundMode {
    ROUND_MODE.with(|m| m.get())
}

pub fn set_round_mode(mode: RoundMode) {
    ROUND_MODE.with(|m| m.set(mode));
}

/// Rounds to an integral value under the current rounding mode.
/// ToNearest resolves ties to even.
pub fn round(x: f64) -> f64 {
    match get_round_mode() {
        RoundMode::ToNearest => x.round_ties_even(),
        RoundMode::TowardZero => x.trunc(),
        RoundMode::Upward => x.ceil(),
        RoundMode::Downward => x.floor(),
        RoundMode::FromZero => {
            if x.is_sign_negative() {
                x.floor()
            } else {
                x.ceil()
            }
        }
    }
}

/// Strict parse: optional leading whitespace, then exactly one number with
/// nothing trailing. Returns None otherwise.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Formats a number the way the grid and saved files show it: integral
/// values without decimals, everything else via the shortest round-trip
/// representation.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}
