use std::io;

use thiserror::Error;

/// Crate-wide `Result` type using [`LangError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, LangError>;

/// Top-level error type for language analysis operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug, Error)]
pub enum LangError {
    /// Script parsing errors.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Output serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with a free-form message.
    #[error("{0}")]
    Generic(String),
}

/// Parsing-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Syntax error in the script.
    #[error("Syntax error: {0}")]
    SyntaxError(String),

    /// Unexpected token while parsing.
    #[error("Expected '{expected}', found '{found}'")]
    UnexpectedToken { expected: String, found: String },

    /// Input ended in the middle of a construct.
    #[error("Unexpected end of input")]
    UnexpectedEof,

    /// Numeric literal that cannot be represented.
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    /// Invalid config format.
    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    /// Invalid field value.
    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },
}

impl From<&str> for LangError {
    fn from(msg: &str) -> Self {
        LangError::Generic(msg.to_owned())
    }
}

impl From<serde_json::Error> for LangError {
    fn from(err: serde_json::Error) -> Self {
        LangError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LangError {
    fn from(err: toml::de::Error) -> Self {
        LangError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::UnexpectedToken {
            expected: ")".to_string(),
            found: "}".to_string(),
        };
        assert_eq!(err.to_string(), "Expected ')', found '}'");

        let wrapped: LangError = err.into();
        assert!(matches!(wrapped, LangError::Parse(_)));
        assert_eq!(wrapped.to_string(), "Expected ')', found '}'");
    }

    #[test]
    fn test_config_error_display() {
        let err: LangError = ConfigError::InvalidValue {
            field: "analysis.database_symbol".to_string(),
            value: "".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid value '' for field 'analysis.database_symbol'"
        );
    }

    #[test]
    fn test_generic_from_str() {
        let err: LangError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}
