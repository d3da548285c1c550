//! Wrapped-type queries.
//!
//! Driver objects can usually be asked whether they wrap a vendor-specific
//! type. Mock objects wrap nothing.

use std::any::type_name;

use crate::error::{Error, Result};

/// Query for wrapped vendor types.
pub trait Wrapper {
    /// Check whether this object wraps a `T`. Always `false`.
    fn is_wrapper_for<T: 'static>(&self) -> bool {
        false
    }

    /// Access the wrapped `T`. Always [`Error::NotSupported`].
    fn unwrap_as<T: 'static>(&self) -> Result<&T> {
        Err(Error::NotSupported(format!(
            "No object found for {}",
            type_name::<T>()
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Plain;
    impl Wrapper for Plain {}

    #[test]
    fn test_wraps_nothing() {
        let plain = Plain;
        assert!(!plain.is_wrapper_for::<String>());
        let err = plain.unwrap_as::<String>().unwrap_err();
        assert!(matches!(err, Error::NotSupported(ref m) if m.contains("String")));
    }
}
