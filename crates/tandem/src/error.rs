//! Error types for tandem.

use tandem_core::{PathError, TandemError};
use thiserror::Error;

/// Errors raised by a [`SelectionAggregator`](crate::selection::SelectionAggregator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// A tracked item does not expose the configured grouping property.
    #[error(
        "item in items source does not contain the expected grouping property {path:?} (on {type_name})"
    )]
    MissingGroupProperty {
        /// The runtime type of the offending item.
        type_name: &'static str,
        /// The configured group path.
        path: String,
        /// The underlying resolution failure.
        #[source]
        source: PathError,
    },
    /// The configured group path could not be parsed.
    #[error("invalid group path: {0}")]
    InvalidGroupPath(#[source] PathError),
    /// The aggregator has no source collection or control attached.
    #[error("selection aggregator is not attached")]
    NotAttached,
}

/// Errors raised by a [`CollectionMirror`](crate::mirror::CollectionMirror).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    /// The mirror was detached, so mutations would no longer propagate.
    #[error("collection mirror is detached")]
    Detached,
}

/// The main error type for tandem operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Core error.
    #[error(transparent)]
    Core(#[from] TandemError),
    /// Mirror error.
    #[error("mirror error: {0}")]
    Mirror(#[from] MirrorError),
    /// Selection error.
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),
}

/// A specialized Result type for tandem operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::CollectionError;

    #[test]
    fn test_missing_group_property_message() {
        let err = SelectionError::MissingGroupProperty {
            type_name: "Person",
            path: "Address.Region".into(),
            source: PathError::MissingMember {
                type_name: "Address",
                member: "Region".into(),
            },
        };
        let message = err.to_string();
        assert!(message.starts_with(
            "item in items source does not contain the expected grouping property"
        ));
        assert!(message.contains("Address.Region"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_conversions() {
        let err: Error = MirrorError::Detached.into();
        assert!(matches!(err, Error::Mirror(MirrorError::Detached)));

        let err: Error = TandemError::from(CollectionError::NullSource).into();
        assert_eq!(err.to_string(), "collection error: bulk add requires a source collection, got none");
    }
}
