//! Version string utilities
//!
//! This module provides:
//! - Constraint-prefix stripping for caller-supplied version strings
//! - Dotted-numeric version parsing (major, minor, patch)
//! - A total order over version strings for latest-version selection

use std::cmp::Ordering;
use thiserror::Error;

/// Constraint prefixes recognised by [`clean`]. Two-character operators
/// must come before their one-character prefixes.
const CONSTRAINT_PREFIXES: &[&str] = &[
    "==", "!=", "~=", ">=", "<=", "^", "~", ">", "<", "=", "!", "v",
];

/// Error returned when a version string is not dotted-numeric
#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid version string: {input}")]
pub struct VersionParseError {
    pub input: String,
}

/// Strips a single leading constraint operator (or `v` prefix) and
/// surrounding whitespace from a version string.
///
/// `clean("^1.2.3")` is `"1.2.3"`, `clean(">= 2.0")` is `"2.0"`.
pub fn clean(version: &str) -> String {
    let trimmed = version.trim();
    for prefix in CONSTRAINT_PREFIXES {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Parses a dotted numeric version into `(major, minor, patch)`.
///
/// Accepts one to three components; missing minor/patch default to 0.
/// Any non-numeric component, empty input, or a fourth component is an
/// error.
pub fn parse(version: &str) -> Result<(u64, u64, u64), VersionParseError> {
    let err = || VersionParseError {
        input: version.to_string(),
    };

    let trimmed = version.trim();
    if trimmed.is_empty() {
        return Err(err());
    }

    let mut parts = [0u64; 3];
    let mut count = 0;
    for component in trimmed.split('.') {
        if count == 3 {
            return Err(err());
        }
        parts[count] = component.parse::<u64>().map_err(|_| err())?;
        count += 1;
    }

    Ok((parts[0], parts[1], parts[2]))
}

/// Compares two version strings with a total order.
///
/// Parseable versions order lexicographically on `(major, minor,
/// patch)`. Versions that fail to parse compare equal to one another
/// and less than any parseable version, so unparseable entries sort
/// last in descending order.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Ok(pa), Ok(pb)) => pa.cmp(&pb),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => Ordering::Equal,
    }
}

/// Returns the highest version in `candidates` per [`compare`], if any.
pub fn max_by_compare<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates.into_iter().max_by(|a, b| compare(a, b))
}
