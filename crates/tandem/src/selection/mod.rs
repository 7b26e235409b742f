//! Group-scoped tri-state selection.
//!
//! A [`SelectionAggregator`] watches the items of a source collection, tracks
//! those whose [`GroupPath`] value equals a configured key, and keeps a
//! [`TriStateControl`] showing whether none, some, or all of them are
//! selected. Toggling the control selects or deselects the whole group.

mod aggregator;
mod config;
mod control;
mod path;

pub use aggregator::SelectionAggregator;
pub use config::{EmptyGroupPolicy, SelectorConfig};
pub use control::{TriStateCheckBox, TriStateControl};
pub use path::{GroupPath, Resolution, resolve, resolve_as, resolve_value};
