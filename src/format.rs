//! Formatting primitives for exported values. Absent values render as the
//! empty string, never as zero or a placeholder.

use rust_decimal::Decimal;

/// Format an asset quantity: plain notation with trailing zeros stripped.
pub fn qty(value: Option<Decimal>) -> String {
    match value {
        Some(quantity) => quantity.normalize().to_string(),
        None => String::new(),
    }
}

/// Format a reporting-currency amount with exactly two fraction digits.
pub fn val(value: Option<Decimal>) -> String {
    match value {
        Some(amount) => format!("{amount:.2}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn qty_strips_trailing_zeros() {
        assert_eq!(qty(Some(dec!(1.500))), "1.5");
        assert_eq!(qty(Some(dec!(0.0100))), "0.01");
        assert_eq!(qty(Some(dec!(100))), "100");
        assert_eq!(qty(Some(dec!(-0.010))), "-0.01");
        assert_eq!(qty(Some(dec!(0.00))), "0");
    }

    #[test]
    fn qty_absent_is_empty() {
        assert_eq!(qty(None), "");
    }

    #[test]
    fn val_two_fraction_digits() {
        assert_eq!(val(Some(dec!(1234.5))), "1234.50");
        assert_eq!(val(Some(dec!(-3))), "-3.00");
        assert_eq!(val(Some(dec!(0.25))), "0.25");
    }

    #[test]
    fn val_absent_is_empty() {
        assert_eq!(val(None), "");
    }
}
