//! Allow-list validation for identifiers interpolated into introspection statements.
//!
//! `SHOW GRANTS TO SHARE <name>` and friends cannot take their object name as a
//! bind parameter, so every share, role and database name passes through
//! [`validate_identifier`] before it is formatted into SQL.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ManifestError;

/// Longest identifier Snowflake accepts.
pub const MAX_IDENTIFIER_LEN: usize = 255;

static DANGEROUS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"[;'"\\]"#,
        r"(?i)\b(DROP|DELETE|INSERT|UPDATE|ALTER|CREATE|TRUNCATE)\b",
        r"--",
        r"/\*",
        r"(?i)\bOR\b.*\b1\s*=\s*1\b",
        r"(?i)\bUNION\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.$-]+$").unwrap());

/// Validate an identifier, returning it with surrounding whitespace removed.
///
/// `context` names the identifier in the error message ("share name",
/// "database role name", ...).
pub fn validate_identifier(identifier: &str, context: &str) -> Result<String, ManifestError> {
    let invalid = |reason: &str| ManifestError::InvalidIdentifier {
        context: context.to_string(),
        reason: reason.to_string(),
    };

    if identifier.is_empty() {
        return Err(invalid("must be a non-empty string"));
    }

    let identifier = identifier.trim();

    if DANGEROUS_PATTERNS.iter().any(|re| re.is_match(identifier)) {
        return Err(invalid("contains dangerous characters or keywords"));
    }

    if !IDENTIFIER_RE.is_match(identifier) {
        return Err(invalid("contains invalid characters"));
    }

    if identifier.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(invalid("too long (max 255 characters)"));
    }

    Ok(identifier.to_string())
}
