//! Pure conversions between user-facing decimal amounts and atomic units.
//!
//! Atomic conversion is done with exact string arithmetic rather than
//! floating point so that high-precision mints (up to 18 decimals) round-trip
//! without drift.

/// Converts a decimal amount string into atomic units, truncating toward
/// zero. Commas are tolerated and stripped. Non-numeric input yields 0;
/// callers validate positivity before converting.
pub fn to_atomic(amount: &str, decimals: u8) -> u64 {
    let cleaned = amount.replace(',', "");
    if cleaned.is_empty()
        || cleaned.matches('.').count() > 1
        || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return 0;
    }

    let (int_part, frac_part) = match cleaned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (cleaned.as_str(), ""),
    };

    let int_val: u128 = if int_part.is_empty() {
        0
    } else {
        match int_part.parse() {
            Ok(v) => v,
            Err(_) => return 0,
        }
    };

    // Truncate fractional digits beyond the mint's precision.
    let mut frac = frac_part.to_string();
    frac.truncate(decimals as usize);
    while frac.len() < decimals as usize {
        frac.push('0');
    }
    let frac_val: u128 = if frac.is_empty() {
        0
    } else {
        match frac.parse() {
            Ok(v) => v,
            Err(_) => return 0,
        }
    };

    let scale = 10u128.pow(decimals as u32);
    let atomic = int_val.saturating_mul(scale).saturating_add(frac_val);
    u64::try_from(atomic).unwrap_or(0)
}

/// Converts atomic units back to a decimal amount.
pub fn from_atomic(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}

/// Formats a value with precision inversely proportional to its magnitude:
/// large balances get coarse precision, dust gets fine precision. Trailing
/// zeros are stripped and the integer part is grouped with commas. The
/// output re-parses exactly via [`parse_display_amount`].
pub fn format_adaptive(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let magnitude = value.abs();
    let precision = if magnitude >= 1_000.0 {
        2
    } else if magnitude >= 1.0 {
        4
    } else if magnitude >= 0.01 {
        6
    } else {
        9
    };

    let fixed = format!("{:.*}", precision, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (trimmed, None),
    };

    let grouped = group_thousands(int_part);
    match frac_part {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

/// Parses a display-formatted amount back to a number, stripping the
/// thousands separators first. Returns `None` on empty or non-numeric input.
pub fn parse_display_amount(value: &str) -> Option<f64> {
    let cleaned = value.replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Strips sign and exponent characters from raw amount input. Applied at the
/// input boundary so downstream code only ever sees non-negative decimals.
pub fn sanitize_amount_input(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '-' | '+' | 'e' | 'E'))
        .collect()
}

fn group_thousands(int_part: &str) -> String {
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}", sign, grouped)
}
