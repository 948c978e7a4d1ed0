//! Duration strings in the notation the ruler speaks (`"1m30s"`, `"2h45m0s"`).
//!
//! Every duration that leaves this system goes through [`format_duration`]:
//! the `duration` label, the group interval, and the `for` field compared at
//! verify time. All three must agree byte-for-byte or reconciliation reports
//! spurious mismatches.

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Errors produced when parsing a duration string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("empty duration string")]
    Empty,

    #[error("invalid duration {input:?}: {reason}")]
    Invalid { input: String, reason: String },
}

/// Render a whole number of seconds, e.g. `90` → `"1m30s"`.
pub fn format_seconds(secs: u64) -> String {
    format_duration(Duration::from_secs(secs))
}

/// Render a duration with hour/minute/second components, dropping leading
/// zero components: `0s`, `1s`, `1m0s`, `1h0m0s`, `1.5s`, `500ms`.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SEC {
        let (scale, unit) = if nanos < 1_000 {
            (1, "ns")
        } else if nanos < 1_000_000 {
            (1_000, "µs")
        } else {
            (1_000_000, "ms")
        };
        return format!("{}{}", fixed_point(nanos, scale), unit);
    }

    let secs = d.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = u128::from(secs % 60) * NANOS_PER_SEC + u128::from(d.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&fixed_point(seconds, NANOS_PER_SEC));
    out.push('s');
    out
}

/// `value / scale` as a decimal with trailing fractional zeros trimmed.
/// `scale` must be a power of ten.
fn fixed_point(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let width = scale.to_string().len() - 1;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Parse a compound duration such as `"1h30m"`, `"90s"`, `"1.5h"` or `"2d"`.
///
/// Accepts Go units (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`) and the
/// Prometheus day/week/year units (`d`, `w`, `y`). A bare `"0"` is zero.
/// Negative durations are rejected.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let invalid = |reason: String| DurationError::Invalid {
        input: input.to_string(),
        reason,
    };

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(invalid(format!("expected a number at {rest:?}")));
        }
        let (number, tail) = rest.split_at(number_len);

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        if unit_len == 0 {
            return Err(invalid(format!("missing unit after {number:?}")));
        }
        let (unit, tail) = tail.split_at(unit_len);

        let scale = unit_nanos(unit).ok_or_else(|| invalid(format!("unknown unit {unit:?}")))?;
        let component =
            scaled(number, scale).ok_or_else(|| invalid(format!("bad number {number:?}")))?;
        total = total
            .checked_add(component)
            .ok_or_else(|| invalid("overflow".to_string()))?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid("overflow".to_string()))?;
    // Remainder is always < 1e9.
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

/// Parse then re-render, e.g. `"90s"` → `"1m30s"`.
pub fn canonicalize(input: &str) -> Result<String, DurationError> {
    parse_duration(input).map(format_duration)
}

fn unit_nanos(unit: &str) -> Option<u128> {
    let n = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        "d" => 86_400 * NANOS_PER_SEC,
        "w" => 7 * 86_400 * NANOS_PER_SEC,
        "y" => 365 * 86_400 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(n)
}

/// `number` (decimal, optional fraction) times `scale`, truncated to whole nanos.
fn scaled(number: &str, scale: u128) -> Option<u128> {
    let (int, frac) = number.split_once('.').unwrap_or((number, ""));
    if (int.is_empty() && frac.is_empty()) || frac.contains('.') {
        return None;
    }

    let whole: u128 = if int.is_empty() { 0 } else { int.parse().ok()? };
    let mut value = whole.checked_mul(scale)?;

    // 18 digits keep frac_value * scale well inside u128.
    let mut frac_value: u128 = 0;
    let mut denom: u128 = 1;
    for c in frac.chars().take(18) {
        frac_value = frac_value * 10 + u128::from(c.to_digit(10)?);
        denom *= 10;
    }
    value = value.checked_add(frac_value * scale / denom)?;
    Some(value)
}
