//! # mockquery-types
//!
//! Stored value representation and lenient conversions for mockquery.
//!
//! Result sets and parameter maps in the mock layer hold [`SqlValue`]s. Typed
//! reads go through the [`FromSql`] trait, which converts between value kinds
//! on a best-effort basis rather than enforcing column types.
//!
//! ## Features
//!
//! - `chrono` (default): date/time kinds via chrono
//! - `uuid` (default): UUID kind
//! - `decimal` (default): exact decimal kind via rust_decimal
//!
//! ## Conversion Rules
//!
//! | Stored kind | Requested as | Result |
//! |-------------|--------------|--------|
//! | absent / `Null` | integer, float | `0` |
//! | absent / `Null` | `bool` | `false` |
//! | absent / `Null` | `Option<T>` | `None` |
//! | text | integer, float, date | parsed |
//! | integer, float | other numeric width | `as` cast |
//! | any | `String` | canonical textual form |
//! | text | `Vec<u8>` | Latin-1 bytes |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod from_sql;
pub mod value;

pub use error::TypeError;
pub use from_sql::{FromSql, convert};
pub use value::SqlValue;
