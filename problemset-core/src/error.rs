/// Errors produced by the `problemset-core` crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A difficulty label was not one of `Easy`, `Medium` or `Hard`.
    #[error("invalid difficulty '{value}': expected Easy, Medium or Hard")]
    InvalidDifficulty { value: String },

    /// The persisted progress record could not be decoded.
    #[error("corrupt progress record: {0}")]
    CorruptProgress(#[from] serde_json::Error),

    /// The local key-value store could not be read or written.
    #[error("local store I/O failed: {0}")]
    LocalStore(#[from] std::io::Error),
}

/// A catalog entry or credential payload failed validation.
///
/// The `Display` text is safe to return to API callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// A required field was absent or `null`.
    #[error("{field} is required")]
    Missing { field: &'static str },

    /// A field carried a JSON value of the wrong type.
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// A text field was empty after trimming.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// A field exceeded its maximum length in characters.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// The difficulty label was not recognised.
    #[error("difficulty must be one of Easy, Medium or Hard")]
    InvalidDifficulty,

    /// A required link was not an absolute http(s) URL.
    #[error("{field} must be an absolute http or https URL")]
    InvalidUrl { field: &'static str },

    /// A new password fell outside the accepted length range.
    #[error("password must be between {min} and {max} bytes")]
    PasswordLength { min: usize, max: usize },
}
