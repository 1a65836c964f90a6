//! Error types for the cv-extract crate.
//!
//! Only structured content can be malformed: PHP array literals and JSON
//! catalogs. Line-oriented extractors never fail.

/// Errors raised while parsing structured catalog content.
///
/// Every variant describes a single malformed file; callers drop that file's
/// contribution and keep going.
///
/// # Examples
///
/// ```
/// use cv_extract::ExtractError;
///
/// let err = ExtractError::UnterminatedString { line: 4 };
/// assert_eq!(err.to_string(), "unterminated string literal starting on line 4");
/// assert_eq!(err.line(), Some(4));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A quoted string ran to end of input.
    #[error("unterminated string literal starting on line {line}")]
    UnterminatedString {
        /// Line of the opening quote.
        line: u32,
    },

    /// An array literal was never closed.
    #[error("unbalanced array literal opened on line {line}")]
    UnbalancedArray {
        /// Line of the opening bracket.
        line: u32,
    },

    /// A character that cannot appear at this point of an array literal.
    #[error("unexpected '{found}' on line {line}")]
    UnexpectedToken {
        /// The offending character.
        found: char,
        /// Line of the character.
        line: u32,
    },

    /// The file has no top-level `return` of an array literal.
    #[error("no returned array literal found")]
    MissingReturn,

    /// A JSON catalog failed to parse.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSON catalog's top level is not an object.
    #[error("JSON catalog must be an object")]
    NotAnObject,
}

impl ExtractError {
    /// Returns the line the error points at, when known.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::UnterminatedString { line }
            | Self::UnbalancedArray { line }
            | Self::UnexpectedToken { line, .. } => Some(*line),
            Self::Json(e) => u32::try_from(e.line()).ok(),
            Self::MissingReturn | Self::NotAnObject => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_token_display() {
        let err = ExtractError::UnexpectedToken { found: ';', line: 9 };
        assert_eq!(err.to_string(), "unexpected ';' on line 9");
    }

    #[test]
    fn test_json_error_line() {
        let source = serde_json::from_str::<serde_json::Value>("{\n\"a\": }").unwrap_err();
        let err = ExtractError::from(source);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_missing_return_has_no_line() {
        assert_eq!(ExtractError::MissingReturn.line(), None);
        assert_eq!(ExtractError::NotAnObject.line(), None);
    }
}
