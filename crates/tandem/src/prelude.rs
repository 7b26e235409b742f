//! Prelude module for tandem.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use tandem::prelude::*;
//! ```

// ============================================================================
// Core primitives
// ============================================================================

pub use tandem_core::{
    CheckState, CollectionChange, ConnectionId, MutableSequence, Notify, ObservableVec, Property,
    PropertyValue, Resolvable, Selectable, Sequence, Signal,
};

// ============================================================================
// Derive macros
// ============================================================================

pub use tandem_macros::Resolvable;

// ============================================================================
// Collection mirroring
// ============================================================================

pub use crate::mirror::{BasicWrapper, CollectionMirror, MirrorConfig, Wrapper, WrapperFactory};

// ============================================================================
// Selection
// ============================================================================

pub use crate::selection::{
    EmptyGroupPolicy, GroupPath, SelectionAggregator, SelectorConfig, TriStateCheckBox,
    TriStateControl,
};

// ============================================================================
// Errors
// ============================================================================

pub use crate::error::{Error, MirrorError, Result, SelectionError};
