//! Money helpers.
//!
//! Amounts are plain [`Decimal`] values in Brazilian reais. There is a single
//! currency, so no currency code travels with the amount.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round an amount to cents, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount for display, e.g. `R$ 1.234,56`.
#[must_use]
pub fn format_brl(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac_part}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money() {
        assert_eq!(round_money("14.605".parse().unwrap()), "14.61".parse().unwrap());
        assert_eq!(round_money("14.6".parse().unwrap()), "14.60".parse().unwrap());
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl("14.6".parse().unwrap()), "R$ 14,60");
        assert_eq!(format_brl("1234.5".parse().unwrap()), "R$ 1.234,50");
        assert_eq!(format_brl("1234567.891".parse().unwrap()), "R$ 1.234.567,89");
        assert_eq!(format_brl(Decimal::ZERO), "R$ 0,00");
        assert_eq!(format_brl("-5".parse().unwrap()), "-R$ 5,00");
    }
}
