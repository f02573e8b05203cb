//! Exact conversion between human-readable token amounts and base units.
//!
//! Everything here is integer arithmetic on the decimal digits. Base units can exceed what a
//! 96-bit decimal mantissa holds at 24 decimals, so the digits are folded straight into a
//! [`BaseUnits`] with overflow checks.

use crate::{error::ConversionError, types::BaseUnits};

/// Token precision of the native NEAR token (1 NEAR = 10^24 yocto).
pub const NEAR_DECIMALS: u32 = 24;

/// Largest precision for which `10^decimals` is still a valid balance.
pub const MAX_DECIMALS: u32 = 38;

/// Converts `amount_raw` (e.g. `"12.5"`) into base units for a token with `decimals` digits
/// of precision.
///
/// Accepts digits with at most one decimal point. Fractional digits beyond `decimals` are an
/// error rather than being rounded away.
pub fn convert(amount_raw: &str, decimals: u32) -> Result<BaseUnits, ConversionError> {
    let amount = amount_raw.trim();
    if amount.is_empty() {
        return Err(ConversionError::Empty);
    }
    if amount.starts_with('-') {
        return Err(ConversionError::Negative(amount.to_owned()));
    }

    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) || !is_digits(fraction) || (whole.is_empty() && fraction.is_empty()) {
        return Err(ConversionError::Malformed(amount.to_owned()));
    }

    if fraction.len() > decimals as usize {
        return Err(ConversionError::TooPrecise {
            amount: amount.to_owned(),
            found: fraction.len(),
            max: decimals,
        });
    }

    let padding = decimals as usize - fraction.len();
    whole
        .bytes()
        .chain(fraction.bytes())
        .chain(std::iter::repeat_n(b'0', padding))
        .try_fold(0u128, |acc, digit| {
            acc.checked_mul(10)?.checked_add(u128::from(digit - b'0'))
        })
        .ok_or_else(|| ConversionError::Overflow(amount.to_owned()))
}

/// Renders base units as a decimal token amount, without trailing fractional zeros.
pub fn format(amount: BaseUnits, decimals: u32) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() { whole.to_owned() } else { format!("{whole}.{fraction}") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ONE_NEAR: u128 = 10u128.pow(NEAR_DECIMALS);

    #[test]
    fn test_convert_whole_and_fractional() {
        assert_eq!(convert("1", NEAR_DECIMALS), Ok(ONE_NEAR));
        assert_eq!(convert("12.5", NEAR_DECIMALS), Ok(12 * ONE_NEAR + ONE_NEAR / 2));
        assert_eq!(convert("12.500000", NEAR_DECIMALS), Ok(12_500_000 * 10u128.pow(18)));
        assert_eq!(convert("0.000000000000000000000001", NEAR_DECIMALS), Ok(1));
        assert_eq!(convert("0", NEAR_DECIMALS), Ok(0));
    }

    #[test]
    fn test_convert_accepts_bare_point_forms() {
        assert_eq!(convert(".5", 1), Ok(5));
        assert_eq!(convert("5.", 1), Ok(50));
        assert_eq!(convert("  7.25 ", 2), Ok(725));
        assert_eq!(convert("007", 0), Ok(7));
    }

    #[test]
    fn test_convert_large_amount_exactly() {
        // Well beyond f64 precision and the 96-bit decimal mantissa.
        let amount = "1000000000.000000000000000000000001";
        assert_eq!(convert(amount, NEAR_DECIMALS), Ok(1_000_000_000 * ONE_NEAR + 1));
    }

    #[test]
    fn test_convert_rejects_malformed() {
        for amount in [".", "1.2.3", "1,5", "1e5", "+1", "abc", "0x10", "1 000", "١"] {
            assert_eq!(
                convert(amount, NEAR_DECIMALS),
                Err(ConversionError::Malformed(amount.to_owned())),
                "{amount}"
            );
        }
        assert_eq!(convert("", NEAR_DECIMALS), Err(ConversionError::Empty));
        assert_eq!(convert("   ", NEAR_DECIMALS), Err(ConversionError::Empty));
    }

    #[test]
    fn test_convert_rejects_negative() {
        assert_eq!(convert("-1", NEAR_DECIMALS), Err(ConversionError::Negative("-1".into())));
        assert_eq!(convert("-0.5", 2), Err(ConversionError::Negative("-0.5".into())));
    }

    #[test]
    fn test_convert_never_truncates() {
        assert_eq!(
            convert("1.005", 2),
            Err(ConversionError::TooPrecise { amount: "1.005".into(), found: 3, max: 2 })
        );
        assert!(convert("1.5", 0).is_err());
    }

    #[test]
    fn test_convert_overflow() {
        let max = u128::MAX.to_string();
        assert_eq!(convert(&max, 0), Ok(u128::MAX));
        assert_eq!(convert(&max, 1), Err(ConversionError::Overflow(max.clone())));
        assert!(matches!(convert("1", 39), Err(ConversionError::Overflow(_))));
        assert_eq!(convert("0", 60), Ok(0));
    }

    #[test]
    fn test_format() {
        assert_eq!(format(12_500_000 * 10u128.pow(18), NEAR_DECIMALS), "12.5");
        assert_eq!(format(ONE_NEAR, NEAR_DECIMALS), "1");
        assert_eq!(format(1, NEAR_DECIMALS), "0.000000000000000000000001");
        assert_eq!(format(0, NEAR_DECIMALS), "0");
        assert_eq!(format(1234, 0), "1234");
        assert_eq!(format(1234, 2), "12.34");
    }

    fn normalize(amount: &str) -> String {
        match amount.split_once('.') {
            Some((whole, fraction)) => {
                let fraction = fraction.trim_end_matches('0');
                if fraction.is_empty() { whole.to_owned() } else { format!("{whole}.{fraction}") }
            }
            None => amount.to_owned(),
        }
    }

    proptest! {
        #[test]
        fn prop_convert_then_format_restores_amount(
            whole in 0u64..1_000_000_000_000,
            fraction in "[0-9]{0,24}",
            decimals in 24u32..=26,
        ) {
            let amount = if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            };
            let base = convert(&amount, decimals).unwrap();
            prop_assert_eq!(format(base, decimals), normalize(&amount));
        }

        #[test]
        fn prop_format_then_convert_is_identity(
            amount in any::<u128>(),
            decimals in 0u32..=MAX_DECIMALS,
        ) {
            prop_assert_eq!(convert(&format(amount, decimals), decimals), Ok(amount));
        }
    }
}
