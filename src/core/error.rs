use thiserror::Error;

use crate::core::template::CustomKind;

#[derive(Debug, Error)]
pub enum FilenameError {
    #[error("invalid format string {format:?} in {{{kind}=...}} token: {source}")]
    CustomFormat {
        kind: CustomKind,
        format: String,
        #[source]
        source: FormatError,
    },
}

/// Why a date or duration format string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("'{0}' is not a standard format")]
    UnknownStandardFormat(char),

    #[error("quoted literal starting with {0} is never closed")]
    UnterminatedQuote(char),

    #[error("format ends with a dangling '{0}'")]
    DanglingEscape(char),

    #[error("'%%' is not a valid specifier")]
    DoublePercent,

    #[error("'{specifier}' repeated {count} times is not supported")]
    TooManySpecifiers { specifier: char, count: usize },

    #[error("'{0}' must be escaped or quoted")]
    UnescapedLiteral(char),
}
