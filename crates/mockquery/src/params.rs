//! Statement parameters and output-parameter registration.
//!
//! Indexed (1-based) and named parameters live in separate maps. The
//! combined view keys both by [`ParamKey`], whose variants cannot collide, so
//! merging never loses an entry.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use mockquery_types::SqlValue;

/// Identity of a parameter: 1-based index or case-sensitive name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    /// Positional parameter, 1-based.
    Index(usize),
    /// Named parameter.
    Name(String),
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(n) => f.write_str(n),
        }
    }
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Lets integer literals name positions. Negative values map to index 0,
/// which no parameter ever occupies.
impl From<i32> for ParamKey {
    fn from(index: i32) -> Self {
        Self::Index(usize::try_from(index).unwrap_or(0))
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// A combined parameter map, ordered by key.
pub type ParameterMap = BTreeMap<ParamKey, SqlValue>;

/// Build a [`ParameterMap`] from `(key, value)` pairs.
///
/// ```rust
/// use mockquery::params::{parameter_map, ParamKey};
/// use mockquery::SqlValue;
///
/// let map = parameter_map([
///     (ParamKey::Index(1), SqlValue::Int(5)),
///     (ParamKey::from("name"), SqlValue::from("x")),
/// ]);
/// assert_eq!(map.get(&ParamKey::Index(1)), Some(&SqlValue::Int(5)));
/// ```
pub fn parameter_map<I>(entries: I) -> ParameterMap
where
    I: IntoIterator<Item = (ParamKey, SqlValue)>,
{
    entries.into_iter().collect()
}

/// Check whether a registered parameter map applies to a statement's
/// parameters.
///
/// With `exact` the maps must be equal; otherwise every registered entry must
/// be present with an equal value.
#[must_use]
pub fn parameters_match(registered: &ParameterMap, actual: &ParameterMap, exact: bool) -> bool {
    if exact {
        return registered == actual;
    }
    registered
        .iter()
        .all(|(key, value)| actual.get(key) == Some(value))
}

/// Input parameters of a prepared or callable statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterStore {
    indexed: BTreeMap<usize, SqlValue>,
    named: BTreeMap<String, SqlValue>,
}

impl ParameterStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a positional parameter.
    pub fn set_indexed(&mut self, index: usize, value: impl Into<SqlValue>) {
        self.indexed.insert(index, value.into());
    }

    /// Set a named parameter.
    pub fn set_named(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.named.insert(name.into(), value.into());
    }

    /// Set a parameter by key.
    pub fn set(&mut self, key: impl Into<ParamKey>, value: impl Into<SqlValue>) {
        match key.into() {
            ParamKey::Index(i) => self.set_indexed(i, value),
            ParamKey::Name(n) => self.set_named(n, value),
        }
    }

    /// Get a parameter by key.
    #[must_use]
    pub fn get(&self, key: &ParamKey) -> Option<&SqlValue> {
        match key {
            ParamKey::Index(i) => self.indexed.get(i),
            ParamKey::Name(n) => self.named.get(n),
        }
    }

    /// Positional parameters.
    #[must_use]
    pub fn indexed(&self) -> &BTreeMap<usize, SqlValue> {
        &self.indexed
    }

    /// Named parameters.
    #[must_use]
    pub fn named(&self) -> &BTreeMap<String, SqlValue> {
        &self.named
    }

    /// Both maps merged into one.
    #[must_use]
    pub fn combined(&self) -> ParameterMap {
        self.indexed
            .iter()
            .map(|(i, v)| (ParamKey::Index(*i), v.clone()))
            .chain(
                self.named
                    .iter()
                    .map(|(n, v)| (ParamKey::Name(n.clone()), v.clone())),
            )
            .collect()
    }

    /// Remove every parameter.
    pub fn clear(&mut self) {
        self.indexed.clear();
        self.named.clear();
    }

    /// Check if no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty() && self.named.is_empty()
    }
}

/// Which output parameters a callable statement registered.
///
/// Registration is membership only; type metadata is not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutParameterSet {
    indexed: BTreeSet<usize>,
    named: BTreeSet<String>,
}

impl OutParameterSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter by key.
    pub fn register(&mut self, key: impl Into<ParamKey>) {
        match key.into() {
            ParamKey::Index(i) => {
                self.indexed.insert(i);
            }
            ParamKey::Name(n) => {
                self.named.insert(n);
            }
        }
    }

    /// Check whether a parameter is registered.
    #[must_use]
    pub fn contains(&self, key: &ParamKey) -> bool {
        match key {
            ParamKey::Index(i) => self.indexed.contains(i),
            ParamKey::Name(n) => self.named.contains(n),
        }
    }

    /// Registered indexes.
    #[must_use]
    pub fn indexed(&self) -> &BTreeSet<usize> {
        &self.indexed
    }

    /// Registered names.
    #[must_use]
    pub fn named(&self) -> &BTreeSet<String> {
        &self.named
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.indexed.clear();
        self.named.clear();
    }

    /// Keep only the entries of `outputs` that are registered.
    #[must_use]
    pub fn filter(&self, outputs: ParameterMap) -> ParameterMap {
        outputs
            .into_iter()
            .filter(|(key, _)| self.contains(key))
            .collect()
    }
}
