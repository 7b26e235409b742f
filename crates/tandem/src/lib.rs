//! tandem: keep observable collections and selection state in step.
//!
//! This is the main crate. It builds two components on the reactive
//! primitives of `tandem-core`:
//!
//! - [`mirror`]: a [`CollectionMirror`](mirror::CollectionMirror) that keeps a
//!   collection of wrapper objects synchronized with the collection of models
//!   they wrap, in both directions
//! - [`selection`]: a [`SelectionAggregator`](selection::SelectionAggregator)
//!   that reduces the selection flags of a group of items to one tri-state
//!   value and fans a toggle back out to the group
//!
//! # Example
//!
//! ```
//! use tandem::prelude::*;
//! use std::sync::Arc;
//!
//! let items: Arc<ObservableVec<i32>> = Arc::new(ObservableVec::new());
//! items.add_range([1, 2, 3]);
//! assert_eq!(items.snapshot(), vec![1, 2, 3]);
//! ```

pub use tandem_core;
pub use tandem_core::logging;
pub use tandem_macros::Resolvable;

mod error;
mod guard;
pub mod mirror;
pub mod prelude;
pub mod selection;

pub use error::{Error, MirrorError, Result, SelectionError};
