use bigdecimal::{BigDecimal, ToPrimitive};
use thiserror::Error;

/// Kobo per naira. The payment gateway's wire format is minor units only;
/// everything else in the system speaks major units.
pub const MINOR_PER_MAJOR: i64 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount '{0}' carries sub-kobo precision")]
    SubMinorPrecision(BigDecimal),
    #[error("amount '{0}' does not fit in a minor-unit integer")]
    OutOfRange(BigDecimal),
}

/// Normalize a monetary value to 2 decimal places (kobo resolution).
pub fn normalize_scale(value: &BigDecimal) -> BigDecimal {
    value.with_scale(2)
}

/// Convert a major-unit amount to minor units (x100). This is the single
/// point where the conversion happens; callers transmit the result to the
/// gateway as-is.
pub fn to_minor_units(major: &BigDecimal) -> Result<i64, MoneyError> {
    let scaled = major * BigDecimal::from(MINOR_PER_MAJOR);
    if !scaled.is_integer() {
        return Err(MoneyError::SubMinorPrecision(major.clone()));
    }
    scaled
        .to_i64()
        .ok_or_else(|| MoneyError::OutOfRange(major.clone()))
}

/// Convert a minor-unit amount reported by the gateway back to major units.
pub fn from_minor_units(minor: i64) -> BigDecimal {
    normalize_scale(&(BigDecimal::from(minor) / BigDecimal::from(MINOR_PER_MAJOR)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_normalize() {
        let v = BigDecimal::from_str("12.3456").unwrap();
        assert_eq!(normalize_scale(&v).to_string(), "12.34");
    }

    #[test]
    fn whole_amount_scales_by_hundred() {
        let v = BigDecimal::from(5000);
        assert_eq!(to_minor_units(&v).unwrap(), 500_000);
    }

    #[test]
    fn kobo_precision_is_exact() {
        let v = BigDecimal::from_str("19.99").unwrap();
        assert_eq!(to_minor_units(&v).unwrap(), 1999);
    }

    #[test]
    fn sub_kobo_precision_rejected() {
        let v = BigDecimal::from_str("10.005").unwrap();
        assert!(matches!(
            to_minor_units(&v),
            Err(MoneyError::SubMinorPrecision(_))
        ));
    }

    #[test]
    fn negative_amounts_convert() {
        let v = BigDecimal::from_str("-2.50").unwrap();
        assert_eq!(to_minor_units(&v).unwrap(), -250);
    }

    #[test]
    fn minor_round_trip() {
        let major = from_minor_units(123_456);
        assert_eq!(major.to_string(), "1234.56");
        assert_eq!(to_minor_units(&major).unwrap(), 123_456);
    }
}
