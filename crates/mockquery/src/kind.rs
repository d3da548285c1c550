//! Statement kind markers.
//!
//! Handlers are generic over the kind of statement they serve, so that
//! operations which only make sense for some kinds are only available there:
//!
//! ```text
//! Plain     -> SQL-keyed responses
//! Prepared  -> SQL-keyed and parameter-keyed responses
//! Callable  -> Prepared + output parameters
//! ```

/// Marker trait for statement kinds.
///
/// This trait is sealed to prevent external implementations,
/// ensuring that only the kinds defined in this crate are valid.
pub trait StatementKind: private::Sealed + 'static {
    /// Name used in log fields.
    const NAME: &'static str;
}

/// Marker trait for kinds whose statements carry input parameters.
pub trait Parameterized: StatementKind {}

/// Plain statements: SQL text supplied on every execute.
#[derive(Debug, Clone, Copy)]
pub struct Plain;

/// Prepared statements: fixed SQL with indexed parameters.
#[derive(Debug, Clone, Copy)]
pub struct Prepared;

/// Callable statements: fixed SQL with indexed and named parameters and
/// output parameters.
#[derive(Debug, Clone, Copy)]
pub struct Callable;

impl StatementKind for Plain {
    const NAME: &'static str = "statement";
}

impl StatementKind for Prepared {
    const NAME: &'static str = "prepared";
}

impl StatementKind for Callable {
    const NAME: &'static str = "callable";
}

impl Parameterized for Prepared {}
impl Parameterized for Callable {}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Plain {}
    impl Sealed for super::Prepared {}
    impl Sealed for super::Callable {}
}
