//! Instance and disk identifier validation.
//!
//! Names become path components under the data directory, so they are
//! validated before any path is derived from them: ASCII alphanumeric
//! segments joined by `.`, `_` or `-`, at most [`MAX_LENGTH`] bytes.

use crate::error::{Result, StoreError};

/// Maximum identifier length in bytes.
pub const MAX_LENGTH: usize = 76;

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '_' | '-')
}

/// Validate an instance or disk identifier.
pub fn validate(name: &str) -> Result<()> {
    let invalid = |reason: &'static str| StoreError::InvalidIdentifier {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > MAX_LENGTH {
        return Err(invalid("must not exceed 76 characters"));
    }

    if !name.starts_with(is_segment_char) {
        return Err(invalid("must start with an ASCII letter or digit"));
    }
    if !name.ends_with(is_segment_char) {
        return Err(invalid("must end with an ASCII letter or digit"));
    }
    if name.chars().any(|c| !is_segment_char(c) && !is_separator(c)) {
        return Err(invalid(
            "may only contain ASCII letters, digits, and the separators '.', '_' and '-'",
        ));
    }

    Ok(())
}
