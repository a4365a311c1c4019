// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Duration parsing for Go-style duration strings.
//!
//! Kubernetes manager configuration serializes durations the way Go's `time.Duration`
//! prints them (e.g., "7h0m0s", "1m30s", "500ms"). This module parses those strings
//! into Rust `std::time::Duration` and renders them as whole seconds for CLI flags.

use anyhow::{bail, Context, Result};
use std::time::Duration;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Parse a Go-style duration string into a Rust `Duration`.
///
/// A duration is a sequence of decimal numbers, each with an optional fraction and a
/// unit suffix. Supported units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`.
/// The single value `"0"` is accepted without a unit. Negative durations are rejected.
///
/// # Examples
///
/// ```
/// use capi_operator::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("7h").unwrap(), Duration::from_secs(25_200));
/// assert_eq!(parse_duration("7h0m0s").unwrap(), Duration::from_secs(25_200));
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
///
/// assert!(parse_duration("").is_err());
/// assert!(parse_duration("10").is_err());  // Missing unit
/// assert!(parse_duration("10x").is_err()); // Invalid unit
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, a component has no unit, a unit is unknown,
/// or the value is negative or not finite.
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    let input = duration_str.trim();
    if input.is_empty() {
        bail!("Duration string cannot be empty");
    }
    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.starts_with('-') {
        bail!("Duration '{duration_str}' must not be negative");
    }

    let mut remaining = input.strip_prefix('+').unwrap_or(input);
    let mut total_nanos = 0.0_f64;

    while !remaining.is_empty() {
        // Numeric part: digits with an optional fraction
        let number_len = remaining
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .with_context(|| format!("Duration '{duration_str}' is missing a unit"))?;
        if number_len == 0 {
            bail!("Duration '{duration_str}' has a unit without a value");
        }
        let (number, rest) = remaining.split_at(number_len);
        let value: f64 = number
            .parse()
            .with_context(|| format!("Invalid number '{number}' in duration '{duration_str}'"))?;

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let (unit, rest) = rest.split_at(unit_len);

        let unit_nanos = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => NANOS_PER_SECOND,
            "m" => 60.0 * NANOS_PER_SECOND,
            "h" => 3_600.0 * NANOS_PER_SECOND,
            _ => bail!(
                "Unsupported duration unit '{unit}' in '{duration_str}'. \
                 Use ns, us, ms, s, m or h"
            ),
        };

        total_nanos += value * unit_nanos;
        remaining = rest;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        bail!("Duration '{duration_str}' is too large");
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Round a duration to the nearest whole second, halves rounding up.
///
/// ```
/// use capi_operator::duration::round_to_seconds;
/// use std::time::Duration;
///
/// assert_eq!(round_to_seconds(Duration::from_millis(1499)), 1);
/// assert_eq!(round_to_seconds(Duration::from_millis(1500)), 2);
/// ```
#[must_use]
pub fn round_to_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() >= 500_000_000 {
        secs + 1
    } else {
        secs
    }
}

/// Parse a Go-style duration string and render it as `"{seconds}s"`.
///
/// # Errors
///
/// Returns an error if the duration cannot be parsed.
pub fn to_seconds_flag(duration_str: &str) -> Result<String> {
    let duration = parse_duration(duration_str)?;
    Ok(format!("{}s", round_to_seconds(duration)))
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod duration_tests;
