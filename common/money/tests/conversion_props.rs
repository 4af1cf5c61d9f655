use bigdecimal::BigDecimal;
use common_money::{from_minor_units, to_minor_units};
use proptest::prelude::*;
use std::str::FromStr;

proptest! {
    // Any kobo value survives the major-unit round trip unchanged.
    #[test]
    fn minor_round_trip(minor in -1_000_000_000_000i64..1_000_000_000_000) {
        let major = from_minor_units(minor);
        prop_assert_eq!(to_minor_units(&major).unwrap(), minor);
    }

    // Whole-naira amounts scale by exactly one hundred on the way out.
    #[test]
    fn whole_major_scales_by_hundred(n in 0i64..10_000_000) {
        let major = BigDecimal::from(n);
        prop_assert_eq!(to_minor_units(&major).unwrap(), n * 100);
    }

    // Two-decimal strings (what the funding form submits) convert exactly.
    #[test]
    fn two_decimal_strings_convert(naira in 0i64..1_000_000, kobo in 0i64..100) {
        let s = format!("{naira}.{kobo:02}");
        let major = BigDecimal::from_str(&s).unwrap();
        prop_assert_eq!(to_minor_units(&major).unwrap(), naira * 100 + kobo);
    }
}
