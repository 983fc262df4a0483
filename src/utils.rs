// Amount conversion between raw integer units and decimal strings.

use ethers::types::U256;
use ethers::utils::{format_units as ethers_format_units, parse_units as ethers_parse_units};

use crate::error::{AppError, Result};

/// Formats a raw integer amount with `decimals` places, trimming trailing
/// zeros but keeping at least one fractional digit (`1.5`, `2.0`).
pub fn format_units(amount: U256, decimals: u8) -> Result<String> {
    let raw = ethers_format_units(amount, u32::from(decimals))
        .map_err(|e| AppError::Internal(format!("Unit formatting failed: {}", e)))?;
    Ok(trim_fraction(&raw))
}

fn trim_fraction(raw: &str) -> String {
    match raw.split_once('.') {
        Some((integer, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", integer)
            } else {
                format!("{}.{}", integer, fraction)
            }
        }
        None => format!("{}.0", raw),
    }
}

/// Parses a user-entered decimal amount into raw units. Rejects empty,
/// negative, malformed and zero amounts, and fractions finer than `decimals`.
pub fn parse_positive_amount(amount: &str, decimals: u8) -> Result<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(invalid_amount());
    }
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.len() > usize::from(decimals) {
            return Err(invalid_amount());
        }
    }
    let parsed: U256 = ethers_parse_units(trimmed, u32::from(decimals))
        .map_err(|_| invalid_amount())?
        .into();
    if parsed.is_zero() {
        return Err(invalid_amount());
    }
    Ok(parsed)
}

fn invalid_amount() -> AppError {
    AppError::BadRequest("Please enter a valid amount".to_string())
}

/// Display helper mirroring `toFixed(places)` for already formatted amounts.
pub fn to_fixed(amount: &str, places: usize) -> String {
    let value = amount.trim().parse::<f64>().unwrap_or(0.0);
    format!("{:.*}", places, value)
}

/// True when a formatted balance string represents a positive amount.
pub fn is_positive_amount(amount: &str) -> bool {
    amount
        .trim()
        .parse::<f64>()
        .map(|value| value > 0.0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_amount_uses_declared_decimals() {
        let raw = U256::from(1_500_000u64);
        assert_eq!(format_units(raw, 6).expect("format"), "1.5");
        assert_eq!(format_units(raw, 18).expect("format"), "0.0000000000015");
    }

    #[test]
    fn whole_and_zero_amounts_keep_one_fraction_digit() {
        assert_eq!(format_units(U256::from(2_000_000u64), 6).expect("format"), "2.0");
        assert_eq!(format_units(U256::zero(), 18).expect("format"), "0.0");
    }

    #[test]
    fn native_amount_formats_ether_units() {
        let one_and_quarter = U256::from(1_250_000_000_000_000_000u128);
        assert_eq!(format_units(one_and_quarter, 18).expect("format"), "1.25");
    }

    #[test]
    fn parse_positive_amount_scales_by_decimals() {
        assert_eq!(
            parse_positive_amount("1.5", 6).expect("parse"),
            U256::from(1_500_000u64)
        );
        assert_eq!(
            parse_positive_amount(" 0.01 ", 18).expect("parse"),
            U256::from(10_000_000_000_000_000u128)
        );
    }

    #[test]
    fn parse_positive_amount_rejects_invalid_input() {
        for input in ["", "   ", "0", "0.0", "-1", "abc", "1.1234567", "0.0000001"] {
            let err = parse_positive_amount(input, 6).expect_err("should reject");
            assert_eq!(err.user_message(), "Please enter a valid amount", "input: {input:?}");
        }
    }

    #[test]
    fn parse_positive_amount_accepts_full_precision() {
        assert_eq!(
            parse_positive_amount("1.123456", 6).expect("parse"),
            U256::from(1_123_456u64)
        );
        assert!(parse_positive_amount("1.5", 0).is_err());
        assert_eq!(parse_positive_amount("25", 0).expect("parse"), U256::from(25u64));
    }

    #[test]
    fn to_fixed_rounds_for_display() {
        assert_eq!(to_fixed("1.23456", 4), "1.2346");
        assert_eq!(to_fixed("not-a-number", 2), "0.00");
    }

    #[test]
    fn positive_amount_detection() {
        assert!(is_positive_amount("0.000001"));
        assert!(!is_positive_amount("0.0"));
        assert!(!is_positive_amount("0"));
        assert!(!is_positive_amount(""));
    }
}
