//! Error types for tandem-core.

use thiserror::Error;

/// Errors raised by observable collections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// A bulk operation was given no source sequence at all.
    #[error("bulk add requires a source collection, got none")]
    NullSource,
    /// An index was outside the collection.
    #[error("index {index} is out of range for a collection of length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The collection length at the time of the call.
        len: usize,
    },
}

/// Errors raised while parsing or walking a dotted property path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path text is empty or contains an empty segment.
    #[error("invalid property path {path:?}")]
    InvalidPath {
        /// The rejected path text.
        path: String,
    },
    /// A segment names a member the object at that step does not have.
    #[error("type {type_name} has no property {member:?}")]
    MissingMember {
        /// The runtime type that was inspected.
        type_name: &'static str,
        /// The member that was requested.
        member: String,
    },
}

/// The main error type for tandem-core operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TandemError {
    /// Collection-related error.
    #[error("collection error: {0}")]
    Collection(#[from] CollectionError),
    /// Path-related error.
    #[error("path error: {0}")]
    Path(#[from] PathError),
}

/// A specialized Result type for tandem-core operations.
pub type Result<T> = std::result::Result<T, TandemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PathError::MissingMember {
            type_name: "Person",
            member: "Adress".into(),
        };
        assert_eq!(err.to_string(), "type Person has no property \"Adress\"");

        let err: TandemError = CollectionError::NullSource.into();
        assert!(err.to_string().starts_with("collection error:"));
    }
}
