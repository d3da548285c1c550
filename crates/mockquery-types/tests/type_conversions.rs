//! Conversion edge case tests.
//!
//! Tests edge cases for:
//! - NULL and absent handling
//! - Text round trips through the canonical textual form
//! - Numeric narrowing and widening
//! - Date/time parsing

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::approx_constant)]

use bytes::Bytes;
use mockquery_types::{FromSql, SqlValue, TypeError, convert};
use proptest::prelude::*;

// ============================================================================
// NULL Handling
// ============================================================================

mod null_handling {
    use super::*;

    #[test]
    fn test_null_to_option_i32() {
        let result = Option::<i32>::from_sql(&SqlValue::Null);
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_null_to_numeric_defaults_to_zero() {
        assert_eq!(i32::from_sql(&SqlValue::Null).unwrap(), 0);
        assert_eq!(i64::from_sql(&SqlValue::Null).unwrap(), 0);
        assert_eq!(f32::from_sql(&SqlValue::Null).unwrap(), 0.0);
    }

    #[test]
    fn test_null_to_string_fails() {
        let result = String::from_sql(&SqlValue::Null);
        assert!(matches!(result, Err(TypeError::UnexpectedNull)));
    }

    #[test]
    fn test_absent_bytes_fails_unless_optional() {
        assert!(matches!(
            convert::<Vec<u8>>(None),
            Err(TypeError::UnexpectedNull)
        ));
        assert_eq!(convert::<Option<Vec<u8>>>(None).unwrap(), None);
    }

    #[test]
    fn test_absent_raw_value_is_null() {
        assert_eq!(convert::<SqlValue>(None).unwrap(), SqlValue::Null);
    }
}

// ============================================================================
// Text Round Trips
// ============================================================================

mod text_round_trips {
    use super::*;

    #[test]
    fn test_bytes_to_text_and_back() {
        let original = vec![0u8, 65, 127, 200, 255];
        let text = String::from_sql(&SqlValue::from(original.clone())).unwrap();
        let back = Vec::<u8>::from_sql(&SqlValue::String(text)).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_non_latin1_text_to_bytes() {
        let bytes = Vec::<u8>::from_sql(&SqlValue::String("a\u{3042}".into())).unwrap();
        assert_eq!(bytes, b"a?");
    }

    #[test]
    fn test_clob_reads_as_text() {
        let value = SqlValue::Clob("large".into());
        assert_eq!(String::from_sql(&value).unwrap(), "large");
    }

    #[test]
    fn test_blob_reads_as_bytes() {
        let value = SqlValue::Blob(Bytes::from_static(b"\x01\x02"));
        assert_eq!(Bytes::from_sql(&value).unwrap(), Bytes::from_static(b"\x01\x02"));
    }

    proptest! {
        #[test]
        fn prop_i64_text_round_trip(n in any::<i64>()) {
            let text = String::from_sql(&SqlValue::BigInt(n)).unwrap();
            prop_assert_eq!(i64::from_sql(&SqlValue::String(text)).unwrap(), n);
        }

        #[test]
        fn prop_latin1_bytes_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let text = String::from_sql(&SqlValue::from(bytes.clone())).unwrap();
            prop_assert_eq!(Vec::<u8>::from_sql(&SqlValue::String(text)).unwrap(), bytes);
        }
    }
}

// ============================================================================
// Numeric Width Conversion
// ============================================================================

mod numeric_widths {
    use super::*;

    #[test]
    fn test_tinyint_widens() {
        assert_eq!(i64::from_sql(&SqlValue::TinyInt(255)).unwrap(), 255);
    }

    #[test]
    fn test_double_narrows_to_int() {
        assert_eq!(i32::from_sql(&SqlValue::Double(-7.9)).unwrap(), -7);
    }

    #[test]
    fn test_bool_reads_as_number() {
        assert_eq!(i32::from_sql(&SqlValue::Bool(true)).unwrap(), 1);
        assert_eq!(f64::from_sql(&SqlValue::Bool(false)).unwrap(), 0.0);
    }

    #[test]
    fn test_binary_is_not_a_number() {
        let result = i32::from_sql(&SqlValue::from(vec![1u8]));
        assert!(matches!(result, Err(TypeError::TypeMismatch { expected: "i32", .. })));
    }

    #[test]
    fn test_float_text() {
        let value = SqlValue::String("3.14".into());
        assert!((f64::from_sql(&value).unwrap() - 3.14).abs() < f64::EPSILON);
    }
}

// ============================================================================
// Optional Kinds
// ============================================================================

#[cfg(feature = "decimal")]
mod decimals {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_decimal_from_text() {
        let value = SqlValue::String("12.50".into());
        assert_eq!(Decimal::from_sql(&value).unwrap(), Decimal::new(1250, 2));
    }

    #[test]
    fn test_decimal_from_integer() {
        assert_eq!(Decimal::from_sql(&SqlValue::Int(9)).unwrap(), Decimal::from(9));
    }

    #[test]
    fn test_decimal_reads_as_double() {
        let value = SqlValue::Decimal(Decimal::new(25, 1));
        assert_eq!(f64::from_sql(&value).unwrap(), 2.5);
    }
}

#[cfg(feature = "chrono")]
mod dates {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    #[test]
    fn test_date_from_text() {
        let value = SqlValue::String("2024-02-29".into());
        assert_eq!(
            NaiveDate::from_sql(&value).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_time_from_text() {
        let value = SqlValue::String("13:45:10".into());
        assert_eq!(
            NaiveTime::from_sql(&value).unwrap(),
            NaiveTime::from_hms_opt(13, 45, 10).unwrap()
        );
    }

    #[test]
    fn test_timestamp_from_date() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        let ts = NaiveDateTime::from_sql(&SqlValue::Date(date)).unwrap();
        assert_eq!(ts.date(), date);
    }

    #[test]
    fn test_invalid_date_text() {
        let result = NaiveDate::from_sql(&SqlValue::String("not a date".into()));
        assert!(matches!(result, Err(TypeError::InvalidDateTime(_))));
    }
}
