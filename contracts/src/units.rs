//! # Decimal Unit Conversion
//!
//! Converts between human-readable token amounts (`"1.5"`) and base units
//! (`1_500_000_000_000_000_000` at 18 decimals). The ledger itself only ever
//! sees base units; this module is for the boundary: config files, scripts,
//! and test fixtures.

use crate::config::MAX_DECIMALS;
use crate::ledger::{Amount, LedgerError};

/// Returns `10^decimals` in base units.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidAmount`] when `decimals` exceeds
/// [`MAX_DECIMALS`].
pub fn pow10(decimals: u8) -> Result<Amount, LedgerError> {
    if decimals > MAX_DECIMALS {
        return Err(LedgerError::InvalidAmount(format!(
            "decimal precision {} exceeds maximum of {}",
            decimals, MAX_DECIMALS
        )));
    }
    Ok(10u128.pow(u32::from(decimals)))
}

/// Parses a decimal string into base units.
///
/// Accepts plain integers (`"100"`) and decimals (`"0.25"`, `".5"`). The
/// fractional part may not have more digits than `decimals`.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidAmount`] for empty input, signs, stray
/// characters, excess precision, or a value that does not fit in `u128`.
pub fn parse_units(input: &str, decimals: u8) -> Result<Amount, LedgerError> {
    let invalid = |reason: &str| LedgerError::InvalidAmount(format!("{:?}: {}", input, reason));

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty amount"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("amounts cannot be negative"));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("no digits"));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected decimal digits"));
    }
    if fraction.len() > usize::from(decimals) {
        return Err(invalid("too many fractional digits"));
    }

    let scale = pow10(decimals)?;
    let overflow = || invalid("amount does not fit in u128");

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<Amount>().map_err(|_| overflow())?
    };
    let fraction_units = if fraction.is_empty() {
        0
    } else {
        // At most `decimals` digits, so this is below `scale`.
        let digits = fraction.parse::<Amount>().map_err(|_| overflow())?;
        let padding = pow10(decimals - fraction.len() as u8)?;
        digits * padding
    };

    whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_units))
        .ok_or_else(overflow)
}

/// Formats base units as a decimal string, trimming trailing zeros.
///
/// `format_units(1_500, 3) == "1.5"`, `format_units(2_000, 3) == "2"`.
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETHER: Amount = 1_000_000_000_000_000_000;

    #[test]
    fn parses_whole_tokens() {
        assert_eq!(parse_units("1000", 18).unwrap(), 1000 * ETHER);
        assert_eq!(parse_units("  7 ", 0).unwrap(), 7);
    }

    #[test]
    fn parses_fractions() {
        assert_eq!(parse_units("1.5", 18).unwrap(), 3 * ETHER / 2);
        assert_eq!(parse_units(".25", 2).unwrap(), 25);
        assert_eq!(parse_units("3.", 2).unwrap(), 300);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "-1", "1.2.3", "abc", "1e18", ".", "+5"] {
            let err = parse_units(bad, 18).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount(_)), "{bad}");
        }
    }

    #[test]
    fn rejects_excess_precision() {
        assert!(parse_units("0.001", 2).is_err());
        assert!(parse_units("1.0", 0).is_err());
    }

    #[test]
    fn rejects_overflow() {
        let too_big = "340282366920938463463374607431768211456"; // u128::MAX + 1
        assert!(parse_units(too_big, 0).is_err());
        assert!(parse_units("1000000000000000000000", 18).is_err());
    }

    #[test]
    fn pow10_bounds() {
        assert_eq!(pow10(0).unwrap(), 1);
        assert_eq!(pow10(18).unwrap(), ETHER);
        assert!(pow10(MAX_DECIMALS).is_ok());
        assert!(pow10(MAX_DECIMALS + 1).is_err());
    }

    #[test]
    fn formats_units() {
        assert_eq!(format_units(1000 * ETHER, 18), "1000");
        assert_eq!(format_units(ETHER / 4, 18), "0.25");
        assert_eq!(format_units(0, 18), "0");
        assert_eq!(format_units(1_500, 3), "1.5");
        assert_eq!(format_units(42, 0), "42");
        assert_eq!(format_units(5, 3), "0.005");
    }
}
