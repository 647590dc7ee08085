//! Round-half-up through an exact decimal.
//!
//! Rounding the binary value directly goes wrong at halves: `2.675_f64` is
//! stored as `2.67499999999999982236431605997495353221893310546875`, so any
//! scale-and-round on the float yields `2.67`. Instead the float is printed in
//! its shortest round-trip form (`"2.675"`), parsed as a decimal, and rounded
//! there.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits produced by the calculator.
pub const ROUNDING_SCALE: u32 = 2;

/// Largest scale a [`Decimal`] can carry.
const MAX_DECIMAL_SCALE: u32 = 28;

/// Round `value` to `scale` fractional digits, exact halves away from zero.
///
/// The result always has exactly `scale` digits after the point (`3.0` →
/// `"3.00"`) and never carries a negative sign on zero. `scale` is capped at
/// 28, the precision limit of [`Decimal`].
///
/// Values too large for a 96-bit mantissa at this scale are always whole
/// numbers; they keep their canonical digits (`5e27` →
/// `"5000000000000000000000000000.00"`) and get zero padding. Non-finite
/// values fall back to fixed formatting.
pub fn round_half_up(value: f64, scale: u32) -> String {
    let scale = scale.min(MAX_DECIMAL_SCALE);

    if let Some(mut rounded) = exact_decimal(value)
        .map(|d| d.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero))
    {
        if rounded.is_zero() {
            rounded.set_sign_positive(true);
        }
        rounded.rescale(scale);
        if rounded.scale() == scale {
            return rounded.to_string();
        }
    }

    let formatted = if value.is_finite() && value.fract() == 0.0 {
        pad_whole(value, scale)
    } else {
        format!("{value:.prec$}", prec = scale as usize)
    };
    match formatted.strip_prefix('-') {
        Some(magnitude) if magnitude.chars().all(|c| c == '0' || c == '.') => {
            magnitude.to_string()
        }
        _ => formatted,
    }
}

fn pad_whole(value: f64, scale: u32) -> String {
    if scale == 0 {
        format!("{value}")
    } else {
        format!("{value}.{}", "0".repeat(scale as usize))
    }
}

/// Exact decimal image of the float's canonical string form.
fn exact_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round2(value: f64) -> String {
        round_half_up(value, ROUNDING_SCALE)
    }

    fn fractional_digits(s: &str) -> Option<usize> {
        let (_, frac) = s.split_once('.')?;
        frac.chars().all(|c| c.is_ascii_digit()).then_some(frac.len())
    }

    #[test]
    fn exact_half_rounds_up_where_binary_rounding_would_not() {
        assert_eq!(round2(2.675), "2.68");
        assert_eq!(round2(1.005), "1.01");
        assert_eq!(round2(0.125), "0.13");
    }

    #[test]
    fn negative_halves_round_away_from_zero() {
        assert_eq!(round2(-1.005), "-1.01");
        assert_eq!(round2(-2.675), "-2.68");
        assert_eq!(round2(-0.125), "-0.13");
    }

    #[test]
    fn pads_to_two_digits() {
        assert_eq!(round2(3.0), "3.00");
        assert_eq!(round2(3.1), "3.10");
        assert_eq!(round2(0.0), "0.00");
    }

    #[test]
    fn below_half_rounds_down() {
        assert_eq!(round2(2.674), "2.67");
        assert_eq!(round2(-2.674), "-2.67");
    }

    #[test]
    fn zero_never_carries_a_sign() {
        assert_eq!(round2(-0.0), "0.00");
        assert_eq!(round2(-0.001), "0.00");
        assert_eq!(round2(-1e-300), "0.00");
    }

    #[test]
    fn float_sum_artifacts_are_rounded_away() {
        assert_eq!(round2(0.1 + 0.2), "0.30");
    }

    #[test]
    fn huge_values_still_have_two_digits() {
        let s = round2(1e300);
        assert_eq!(fractional_digits(&s), Some(2));
        assert!(s.ends_with(".00"));
    }

    #[test]
    fn huge_values_keep_their_canonical_digits() {
        assert_eq!(round2(5e27), "5000000000000000000000000000.00");
        assert_eq!(round2(-5e27), "-5000000000000000000000000000.00");
        assert_eq!(round2(7.9e28), "79000000000000000000000000000.00");
        assert_eq!(round_half_up(1e30, 0), "1000000000000000000000000000000");
    }

    #[test]
    fn non_finite_values_do_not_panic() {
        assert_eq!(round2(f64::INFINITY), "inf");
        assert_eq!(round2(f64::NAN), "NaN");
    }

    #[test]
    fn other_scales() {
        assert_eq!(round_half_up(2.5, 0), "3");
        assert_eq!(round_half_up(-2.5, 0), "-3");
        assert_eq!(round_half_up(1.0005, 3), "1.001");
    }

    proptest! {
        #[test]
        fn always_two_fractional_digits(value in -1.0e15f64..1.0e15f64) {
            prop_assert_eq!(fractional_digits(&round2(value)), Some(2));
        }

        #[test]
        fn always_two_fractional_digits_for_any_normal(value in prop::num::f64::NORMAL) {
            prop_assert_eq!(fractional_digits(&round2(value)), Some(2));
        }

        #[test]
        fn rounding_moves_by_at_most_half_a_cent(value in -1.0e9f64..1.0e9f64) {
            let rounded: f64 = round2(value).parse().unwrap();
            prop_assert!((rounded - value).abs() <= 0.005 + 1e-6);
        }
    }
}
