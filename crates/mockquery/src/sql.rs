//! Lightweight SQL classification.
//!
//! The mock never parses SQL. Deciding whether a statement produces rows is a
//! best-effort look at its leading keyword, used only when no explicit
//! override was registered with the handler.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading keywords treated as data retrieval.
pub const QUERY_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES", "SHOW", "EXPLAIN", "DESCRIBE"];

#[allow(clippy::expect_used)] // pattern is a compile-time constant
static QUERY_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"(?i)^[\s(]*(?:{})\b", QUERY_KEYWORDS.join("|"));
    Regex::new(&pattern).expect("query keyword pattern is valid")
});

/// Heuristically decide whether `sql` returns a result set.
///
/// True when the first keyword, after whitespace and opening parentheses, is
/// one of [`QUERY_KEYWORDS`]. Comments and vendor syntax are not recognized.
#[must_use]
pub fn is_select(sql: &str) -> bool {
    QUERY_RE.is_match(sql)
}

/// Extract the operation type from a SQL statement, for log fields.
#[must_use]
pub fn extract_operation(sql: &str) -> &'static str {
    let sql_upper = sql.trim_start().to_uppercase();

    if is_select(sql) {
        "QUERY"
    } else if sql_upper.starts_with("INSERT") {
        "INSERT"
    } else if sql_upper.starts_with("UPDATE") {
        "UPDATE"
    } else if sql_upper.starts_with("DELETE") {
        "DELETE"
    } else if sql_upper.starts_with("CALL")
        || sql_upper.starts_with("{CALL")
        || sql_upper.starts_with("EXEC")
    {
        "CALL"
    } else {
        "OTHER"
    }
}
