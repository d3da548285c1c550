//! Handler and statement configuration.

use std::time::Duration;

use crate::matcher::{MatchMode, SqlMatcher};

/// Matching and failure policy for a result-set handler.
///
/// Every handler owns its own copy. A [`crate::Connection`] created with
/// [`crate::Connection::with_config`] applies one configuration to all three
/// of its handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Whether SQL keys are compared case-sensitively (default: false).
    pub case_sensitive: bool,
    /// How SQL keys are compared with executed SQL (default: contains).
    pub match_mode: MatchMode,
    /// Whether a batch keeps going after a failed item (default: false).
    pub continue_on_batch_failure: bool,
    /// Whether output parameters must be registered to be visible
    /// (default: false).
    pub must_register_out_parameters: bool,
    /// Whether registered parameters must equal the statement's parameters
    /// rather than be a subset of them (default: false).
    pub exact_match_parameters: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            match_mode: MatchMode::Contains,
            continue_on_batch_failure: false,
            must_register_out_parameters: false,
            exact_match_parameters: false,
        }
    }
}

impl HandlerConfig {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable case-sensitive matching.
    #[must_use]
    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    /// Set the match mode.
    #[must_use]
    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Use exact matching.
    #[must_use]
    pub fn exact(self) -> Self {
        self.match_mode(MatchMode::Exact)
    }

    /// Use full-match regular expressions.
    #[must_use]
    pub fn regex(self) -> Self {
        self.match_mode(MatchMode::Regex)
    }

    /// Keep processing a batch after a failed item.
    #[must_use]
    pub fn continue_on_batch_failure(mut self, enabled: bool) -> Self {
        self.continue_on_batch_failure = enabled;
        self
    }

    /// Only expose output parameters that were registered.
    #[must_use]
    pub fn must_register_out_parameters(mut self, enabled: bool) -> Self {
        self.must_register_out_parameters = enabled;
        self
    }

    /// Require registered parameter maps to equal the statement's.
    #[must_use]
    pub fn exact_match_parameters(mut self, enabled: bool) -> Self {
        self.exact_match_parameters = enabled;
        self
    }

    /// The matcher described by this configuration.
    #[must_use]
    pub fn matcher(&self) -> SqlMatcher {
        SqlMatcher::new(self.match_mode, self.case_sensitive)
    }
}

/// Statement settings a driver would honor but the mock only records.
///
/// None of these affect resolution; there is no real work to time out,
/// cancel, or page through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementOptions {
    /// Query timeout (default: none).
    pub query_timeout: Option<Duration>,
    /// Maximum rows per result set; zero means unlimited.
    pub max_rows: u32,
    /// Maximum field size in bytes; zero means unlimited.
    pub max_field_size: u32,
    /// Fetch size hint.
    pub fetch_size: u32,
    /// Cursor name for positioned updates.
    pub cursor_name: Option<String>,
    /// Whether the statement may be pooled.
    pub poolable: bool,
    /// Whether escape processing is on (default: false).
    pub escape_processing: bool,
}

impl StatementOptions {
    /// Create options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query timeout.
    #[must_use]
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Set the maximum row count.
    #[must_use]
    pub fn max_rows(mut self, max: u32) -> Self {
        self.max_rows = max;
        self
    }

    /// Set the fetch size hint.
    #[must_use]
    pub fn fetch_size(mut self, size: u32) -> Self {
        self.fetch_size = size;
        self
    }

    /// Set the cursor name.
    #[must_use]
    pub fn cursor_name(mut self, name: impl Into<String>) -> Self {
        self.cursor_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_config_defaults() {
        let config = HandlerConfig::default();
        assert!(!config.case_sensitive);
        assert_eq!(config.match_mode, MatchMode::Contains);
        assert!(!config.continue_on_batch_failure);
        assert!(!config.must_register_out_parameters);
        assert!(!config.exact_match_parameters);
    }

    #[test]
    fn test_handler_config_builder() {
        let config = HandlerConfig::new()
            .exact()
            .case_sensitive(true)
            .continue_on_batch_failure(true)
            .must_register_out_parameters(true);
        assert_eq!(config.match_mode, MatchMode::Exact);
        assert!(config.case_sensitive);
        assert!(config.continue_on_batch_failure);
        assert!(config.must_register_out_parameters);
    }

    #[test]
    fn test_statement_options_builder() {
        let options = StatementOptions::new()
            .query_timeout(Duration::from_secs(5))
            .max_rows(10)
            .cursor_name("c1");
        assert_eq!(options.query_timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.max_rows, 10);
        assert_eq!(options.cursor_name.as_deref(), Some("c1"));
    }
}
