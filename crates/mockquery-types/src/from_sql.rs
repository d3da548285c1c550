//! Lenient conversion from stored values to Rust types.
//!
//! A mock layer has no column metadata to enforce, so every conversion is
//! best-effort: text is parsed into numbers, dates and booleans, numbers are
//! narrowed or widened with `as` semantics, and everything renders to text
//! through [`SqlValue`]'s `Display` implementation.
//!
//! Absent and NULL values go through [`FromSql::from_null`]: numeric targets
//! yield zero, `bool` yields `false`, and object-like targets (text, bytes,
//! decimals, dates) report [`TypeError::UnexpectedNull`] unless requested as
//! an `Option`.

use std::str::FromStr;

use bytes::Bytes;

use crate::error::TypeError;
use crate::value::SqlValue;

/// Trait for types that can be read out of a stored value.
pub trait FromSql: Sized {
    /// Convert from a stored value to this type.
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError>;

    /// The value reported for an absent or NULL value.
    fn from_null() -> Result<Self, TypeError> {
        Err(TypeError::UnexpectedNull)
    }

    /// Convert from an optional stored value.
    ///
    /// Returns `None` if the value is NULL.
    fn from_sql_nullable(value: &SqlValue) -> Result<Option<Self>, TypeError> {
        if value.is_null() {
            Ok(None)
        } else {
            Self::from_sql(value).map(Some)
        }
    }
}

/// Convert a possibly absent value to `T`.
///
/// This is the single entry point behind every typed getter: absent and NULL
/// values map to [`FromSql::from_null`], anything else to
/// [`FromSql::from_sql`].
pub fn convert<T: FromSql>(value: Option<&SqlValue>) -> Result<T, TypeError> {
    match value {
        None | Some(SqlValue::Null) => T::from_null(),
        Some(v) => T::from_sql(v),
    }
}

fn mismatch(expected: &'static str, value: &SqlValue) -> TypeError {
    TypeError::TypeMismatch {
        expected,
        actual: value.type_name().to_string(),
    }
}

fn parse_text<T: FromStr>(text: &str, target: &'static str) -> Result<T, TypeError> {
    text.trim().parse().map_err(|_| TypeError::Parse {
        target,
        value: text.to_string(),
    })
}

macro_rules! impl_from_sql_integer {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl FromSql for $ty {
            fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
                match value {
                    SqlValue::Null => Self::from_null(),
                    SqlValue::Bool(v) => Ok(<$ty>::from(u8::from(*v))),
                    SqlValue::String(s) | SqlValue::Clob(s) => parse_text::<$ty>(s, $name)
                        .or_else(|_| parse_text::<f64>(s, $name).map(|f| f as $ty)),
                    other => match (other.as_i64(), other.as_f64()) {
                        (Some(i), _) => Ok(i as $ty),
                        (None, Some(f)) => Ok(f as $ty),
                        _ => Err(mismatch($name, other)),
                    },
                }
            }

            fn from_null() -> Result<Self, TypeError> {
                Ok(0)
            }
        }
    )*};
}

impl_from_sql_integer!(u8 => "u8", i16 => "i16", i32 => "i32", i64 => "i64");

macro_rules! impl_from_sql_float {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl FromSql for $ty {
            fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
                match value {
                    SqlValue::Null => Self::from_null(),
                    SqlValue::Bool(v) => Ok(<$ty>::from(u8::from(*v))),
                    SqlValue::String(s) | SqlValue::Clob(s) => parse_text::<$ty>(s, $name),
                    other => other
                        .as_f64()
                        .map(|f| f as $ty)
                        .ok_or_else(|| mismatch($name, other)),
                }
            }

            fn from_null() -> Result<Self, TypeError> {
                Ok(0.0)
            }
        }
    )*};
}

impl_from_sql_float!(f32 => "f32", f64 => "f64");

impl FromSql for bool {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Null => Self::from_null(),
            SqlValue::Bool(v) => Ok(*v),
            SqlValue::String(s) | SqlValue::Clob(s) => {
                let s = s.trim();
                Ok(s.eq_ignore_ascii_case("true") || s == "1")
            }
            other => other
                .as_f64()
                .map(|f| f != 0.0)
                .ok_or_else(|| mismatch("bool", other)),
        }
    }

    fn from_null() -> Result<Self, TypeError> {
        Ok(false)
    }
}

impl FromSql for String {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Null => Self::from_null(),
            SqlValue::String(v) | SqlValue::Clob(v) => Ok(v.clone()),
            other => Ok(other.to_string()),
        }
    }
}

/// Encode text as Latin-1, the inverse of the binary `Display` form.
///
/// Characters outside Latin-1 become `?`.
fn latin1_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

impl FromSql for Vec<u8> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Null => Self::from_null(),
            SqlValue::Binary(v) | SqlValue::Blob(v) => Ok(v.to_vec()),
            other => Ok(latin1_bytes(&other.to_string())),
        }
    }
}

impl FromSql for Bytes {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Null => Self::from_null(),
            SqlValue::Binary(v) | SqlValue::Blob(v) => Ok(v.clone()),
            other => Ok(Bytes::from(latin1_bytes(&other.to_string()))),
        }
    }
}

impl FromSql for SqlValue {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        Ok(value.clone())
    }

    fn from_null() -> Result<Self, TypeError> {
        Ok(SqlValue::Null)
    }
}

impl<T: FromSql> FromSql for Option<T> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        T::from_sql_nullable(value)
    }

    fn from_null() -> Result<Self, TypeError> {
        Ok(None)
    }
}

#[cfg(feature = "uuid")]
impl FromSql for uuid::Uuid {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Null => Self::from_null(),
            SqlValue::Uuid(v) => Ok(*v),
            SqlValue::Binary(b) if b.len() == 16 => {
                let bytes: [u8; 16] = b[..]
                    .try_into()
                    .map_err(|_| TypeError::InvalidUuid("invalid UUID length".to_string()))?;
                Ok(uuid::Uuid::from_bytes(bytes))
            }
            SqlValue::String(s) | SqlValue::Clob(s) => s
                .trim()
                .parse()
                .map_err(|e| TypeError::InvalidUuid(format!("{e}"))),
            _ => Err(mismatch("Uuid", value)),
        }
    }
}

#[cfg(feature = "decimal")]
impl FromSql for rust_decimal::Decimal {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Null => Self::from_null(),
            SqlValue::Decimal(v) => Ok(*v),
            SqlValue::String(s) | SqlValue::Clob(s) => s
                .trim()
                .parse()
                .map_err(|e| TypeError::InvalidDecimal(format!("{e}"))),
            SqlValue::Float(f) => rust_decimal::Decimal::try_from(*f)
                .map_err(|e| TypeError::InvalidDecimal(format!("{e}"))),
            SqlValue::Double(f) => rust_decimal::Decimal::try_from(*f)
                .map_err(|e| TypeError::InvalidDecimal(format!("{e}"))),
            other => other
                .as_i64()
                .map(rust_decimal::Decimal::from)
                .ok_or_else(|| mismatch("Decimal", other)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveDate {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Null => Self::from_null(),
            SqlValue::Date(v) => Ok(*v),
            SqlValue::DateTime(v) => Ok(v.date()),
            SqlValue::String(s) | SqlValue::Clob(s) => {
                chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map_err(|e| TypeError::InvalidDateTime(format!("{s}: {e}")))
            }
            _ => Err(mismatch("NaiveDate", value)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveTime {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Null => Self::from_null(),
            SqlValue::Time(v) => Ok(*v),
            SqlValue::DateTime(v) => Ok(v.time()),
            SqlValue::String(s) | SqlValue::Clob(s) => {
                chrono::NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
                    .map_err(|e| TypeError::InvalidDateTime(format!("{s}: {e}")))
            }
            _ => Err(mismatch("NaiveTime", value)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveDateTime {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Null => Self::from_null(),
            SqlValue::DateTime(v) => Ok(*v),
            SqlValue::Date(v) => v
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| TypeError::InvalidDateTime(v.to_string())),
            SqlValue::String(s) | SqlValue::Clob(s) => {
                let text = s.trim();
                chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                    .or_else(|_| chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
                    .map_err(|e| TypeError::InvalidDateTime(format!("{s}: {e}")))
            }
            _ => Err(mismatch("NaiveDateTime", value)),
        }
    }
}
