//! SQL key matching.
//!
//! A registered key matches an executed statement according to a
//! [`MatchMode`] and a case-sensitivity flag. [`matches`] is a pure function
//! of its inputs. Registered keys are held as [`KeyPattern`]s, which compile
//! a regular-expression key at most once per case-sensitivity setting.

use once_cell::unsync::OnceCell;
use regex::{Regex, RegexBuilder};

/// How a registered SQL key is compared with executed SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The key equals the SQL.
    Exact,
    /// The SQL contains the key.
    #[default]
    Contains,
    /// The key is a regular expression that matches the whole SQL.
    ///
    /// `.` also matches line breaks.
    Regex,
}

/// A match strategy: mode plus case sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SqlMatcher {
    mode: MatchMode,
    case_sensitive: bool,
}

impl SqlMatcher {
    /// Create a matcher.
    #[must_use]
    pub fn new(mode: MatchMode, case_sensitive: bool) -> Self {
        Self {
            mode,
            case_sensitive,
        }
    }

    /// The match mode.
    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Whether comparison is case-sensitive.
    #[must_use]
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Check whether `key` matches `sql`.
    #[must_use]
    pub fn matches(&self, key: &str, sql: &str) -> bool {
        matches(key, sql, self.mode, self.case_sensitive)
    }
}

/// Check whether a registered `key` matches the executed `sql`.
#[must_use]
pub fn matches(key: &str, sql: &str, mode: MatchMode, case_sensitive: bool) -> bool {
    let matched = match mode {
        MatchMode::Exact if case_sensitive => key == sql,
        MatchMode::Exact => key.to_lowercase() == sql.to_lowercase(),
        MatchMode::Contains if case_sensitive => sql.contains(key),
        MatchMode::Contains => sql.to_lowercase().contains(&key.to_lowercase()),
        MatchMode::Regex => matches_regex(key, sql, case_sensitive),
    };
    tracing::trace!(key = key, sql = sql, ?mode, matched, "key match");
    matched
}

fn matches_regex(pattern: &str, sql: &str, case_sensitive: bool) -> bool {
    compile(pattern, case_sensitive).is_some_and(|re| re.is_match(sql))
}

/// Compile `pattern` anchored at both ends; `None` (logged) when invalid.
fn compile(pattern: &str, case_sensitive: bool) -> Option<Regex> {
    let anchored = format!("^(?:{pattern})$");
    RegexBuilder::new(&anchored)
        .dot_matches_new_line(true)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| {
            tracing::warn!(pattern = pattern, error = %e, "invalid regex key never matches");
        })
        .ok()
}

/// A registered SQL key with its compiled regular expressions.
///
/// The match mode and case sensitivity are read on every lookup, so they may
/// change after registration; each regex variant is compiled on first use.
#[derive(Debug, Clone)]
pub(crate) struct KeyPattern {
    key: String,
    case_sensitive: OnceCell<Option<Regex>>,
    case_insensitive: OnceCell<Option<Regex>>,
}

impl KeyPattern {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            case_sensitive: OnceCell::new(),
            case_insensitive: OnceCell::new(),
        }
    }

    pub(crate) fn matches(&self, matcher: SqlMatcher, sql: &str) -> bool {
        if matcher.mode != MatchMode::Regex {
            return matcher.matches(&self.key, sql);
        }
        let cell = if matcher.case_sensitive {
            &self.case_sensitive
        } else {
            &self.case_insensitive
        };
        let matched = cell
            .get_or_init(|| compile(&self.key, matcher.case_sensitive))
            .as_ref()
            .is_some_and(|re| re.is_match(sql));
        tracing::trace!(key = %self.key, sql = sql, mode = ?matcher.mode, matched, "key match");
        matched
    }
}
