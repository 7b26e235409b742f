//! Observable collections.
//!
//! [`ObservableVec<T>`] is a vector behind a lock that announces every
//! structural change through its `collection_changed` signal. Each mutation
//! emits exactly one [`CollectionChange`] after the write lock has been
//! released, so handlers are free to read or mutate the collection again.
//!
//! The [`Sequence`] and [`MutableSequence`] traits abstract over observable and
//! plain containers. A plain `parking_lot::RwLock<Vec<T>>` implements both but
//! reports no changes.
//!
//! # Bulk adds
//!
//! [`ObservableVec::add_range`] appends many items and emits a single
//! [`CollectionChange::Reset`] instead of one `Added` per item:
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tandem_core::ObservableVec;
//!
//! let list = ObservableVec::<u32>::new();
//! let events = Arc::new(AtomicUsize::new(0));
//! let events_clone = events.clone();
//! list.collection_changed.connect(move |change| {
//!     assert!(change.is_reset());
//!     events_clone.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! list.add_range([1, 2, 3]);
//! assert_eq!(list.snapshot(), vec![1, 2, 3]);
//! assert_eq!(events.load(Ordering::SeqCst), 1);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::CollectionError;
use crate::logging::{PerfSpan, span_names, targets};
use crate::signal::Signal;

/// A structural change to an observable collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionChange<T> {
    /// Items were inserted starting at `index`.
    Added {
        /// Position of the first inserted item.
        index: usize,
        /// The inserted items, in order.
        items: Vec<T>,
    },
    /// Items were removed starting at `index`.
    Removed {
        /// Former position of the first removed item.
        index: usize,
        /// The removed items, in order.
        items: Vec<T>,
    },
    /// The contents changed wholesale.
    ///
    /// Observers should rebuild any derived state from the collection itself.
    Reset {
        /// The items present before the reset.
        removed: Vec<T>,
        /// The items introduced by the reset.
        added: Vec<T>,
    },
}

impl<T> CollectionChange<T> {
    /// The items this change introduced.
    pub fn added(&self) -> &[T] {
        match self {
            CollectionChange::Added { items, .. } => items,
            CollectionChange::Reset { added, .. } => added,
            CollectionChange::Removed { .. } => &[],
        }
    }

    /// The items this change took away.
    pub fn removed(&self) -> &[T] {
        match self {
            CollectionChange::Removed { items, .. } => items,
            CollectionChange::Reset { removed, .. } => removed,
            CollectionChange::Added { .. } => &[],
        }
    }

    /// Returns `true` for [`CollectionChange::Reset`].
    pub fn is_reset(&self) -> bool {
        matches!(self, CollectionChange::Reset { .. })
    }
}

/// A readable, possibly observable, ordered collection.
pub trait Sequence<T>: Send + Sync {
    /// A copy of the current contents, in order.
    fn snapshot(&self) -> Vec<T>;

    /// The number of items.
    fn len(&self) -> usize;

    /// Returns `true` if the collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The change signal, or `None` if the collection does not report changes.
    fn collection_changed(&self) -> Option<&Signal<CollectionChange<T>>> {
        None
    }
}

/// A [`Sequence`] that can be written to.
pub trait MutableSequence<T>: Sequence<T> {
    /// Append an item.
    fn push(&self, item: T);

    /// Remove the first item matching `pred`, returning it.
    fn remove_where(&self, pred: &dyn Fn(&T) -> bool) -> Option<T>;

    /// Remove every item.
    fn clear(&self);

    /// Insert `items` as one run starting at `index`, clamped to the length.
    ///
    /// The default appends each item with [`push`](Self::push); collections
    /// with positional inserts override it to keep order and batch the change.
    fn insert_all(&self, index: usize, items: Vec<T>) {
        let _ = index;
        for item in items {
            self.push(item);
        }
    }

    /// Replace the whole contents.
    fn replace_all(&self, items: Vec<T>) {
        self.clear();
        for item in items {
            self.push(item);
        }
    }
}

/// An observable vector.
///
/// All methods take `&self`; the contents live behind a `RwLock` and the
/// collection is normally shared as `Arc<ObservableVec<T>>`.
pub struct ObservableVec<T> {
    items: RwLock<Vec<T>>,
    suppressed: AtomicBool,
    /// Emitted once after every structural change.
    pub collection_changed: Signal<CollectionChange<T>>,
}

impl<T: Clone + Send + Sync + 'static> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> From<Vec<T>> for ObservableVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Clone + Send + Sync + 'static> ObservableVec<T> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create a collection with initial contents. No change is emitted.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            suppressed: AtomicBool::new(false),
            collection_changed: Signal::new(),
        }
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// A clone of the item at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().get(index).cloned()
    }

    /// A copy of the current contents, in order.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.read().clone()
    }

    /// Access the contents through a closure without cloning.
    ///
    /// The read lock is held for the duration of `f`; do not mutate the
    /// collection from inside it.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[T]) -> R,
    {
        f(&self.items.read())
    }

    /// Returns `true` if any item matches `pred`.
    pub fn contains_where<F>(&self, pred: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.items.read().iter().any(pred)
    }

    /// The index of the first item matching `pred`.
    pub fn position_where<F>(&self, pred: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.items.read().iter().position(pred)
    }

    /// Returns `true` while per-item notifications are suppressed by a bulk add.
    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }

    /// Append an item.
    pub fn push(&self, item: T) {
        let index = {
            let mut items = self.items.write();
            items.push(item.clone());
            items.len() - 1
        };
        self.notify(CollectionChange::Added {
            index,
            items: vec![item],
        });
    }

    /// Insert an item at `index`.
    ///
    /// Fails with [`CollectionError::IndexOutOfRange`] if `index > len()`.
    pub fn insert(&self, index: usize, item: T) -> Result<(), CollectionError> {
        {
            let mut items = self.items.write();
            if index > items.len() {
                crate::tandem_debug!(index, len = items.len(), "insert out of range");
                return Err(CollectionError::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, item.clone());
        }
        self.notify(CollectionChange::Added {
            index,
            items: vec![item],
        });
        Ok(())
    }

    /// Append every item as one contiguous run.
    ///
    /// Emits a single `Added` for the whole run, or nothing when `items` is
    /// empty.
    pub fn extend<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.splice_in(usize::MAX, items.into_iter().collect());
    }

    /// Insert every item as one contiguous run starting at `index`.
    ///
    /// Emits a single `Added` at `index`, or nothing when `items` is empty.
    /// Fails with [`CollectionError::IndexOutOfRange`] if `index > len()`.
    pub fn insert_range<I>(&self, index: usize, items: I) -> Result<(), CollectionError>
    where
        I: IntoIterator<Item = T>,
    {
        let len = self.len();
        if index > len {
            crate::tandem_debug!(index, len, "insert_range out of range");
            return Err(CollectionError::IndexOutOfRange { index, len });
        }
        self.splice_in(index, items.into_iter().collect());
        Ok(())
    }

    /// Splice `added` in at `index`, clamped to the length, and notify once.
    fn splice_in(&self, index: usize, added: Vec<T>) {
        if added.is_empty() {
            return;
        }
        let index = {
            let mut items = self.items.write();
            let index = index.min(items.len());
            items.splice(index..index, added.iter().cloned());
            index
        };
        self.notify(CollectionChange::Added {
            index,
            items: added,
        });
    }

    /// Remove and return the item at `index`, or `None` if out of range.
    pub fn remove_at(&self, index: usize) -> Option<T> {
        let removed = {
            let mut items = self.items.write();
            if index >= items.len() {
                return None;
            }
            items.remove(index)
        };
        self.notify(CollectionChange::Removed {
            index,
            items: vec![removed.clone()],
        });
        Some(removed)
    }

    /// Remove and return the first item matching `pred`.
    pub fn remove_where<F>(&self, pred: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
    {
        let (index, removed) = {
            let mut items = self.items.write();
            let index = items.iter().position(pred)?;
            (index, items.remove(index))
        };
        self.notify(CollectionChange::Removed {
            index,
            items: vec![removed.clone()],
        });
        Some(removed)
    }

    /// Remove every item. Emits `Reset` with the old contents as `removed`.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.items.write());
        self.notify(CollectionChange::Reset {
            removed,
            added: Vec::new(),
        });
    }

    /// Replace the whole contents, emitting a single `Reset`.
    pub fn replace_all(&self, items: Vec<T>) {
        let removed = std::mem::replace(&mut *self.items.write(), items.clone());
        self.notify(CollectionChange::Reset {
            removed,
            added: items,
        });
    }

    /// Append every item, then emit exactly one `Reset`.
    ///
    /// Per-item notifications are suppressed while the items are added. The
    /// final `Reset` carries an empty `removed` list and the appended items as
    /// `added`. It is emitted even when `items` is empty, and also when the
    /// iterator panics part way through, in which case it carries whatever was
    /// appended before the panic.
    pub fn add_range<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let _span = PerfSpan::new(span_names::ADD_RANGE);
        let mut guard = BulkAdd::begin(self);
        for item in items {
            self.push(item.clone());
            guard.added.push(item);
        }
        tracing::trace!(target: targets::COLLECTION, count = guard.added.len(), "bulk add complete");
    }

    /// Null-checking form of [`add_range`](Self::add_range).
    ///
    /// `None` is rejected with [`CollectionError::NullSource`] and nothing is
    /// emitted.
    pub fn try_add_range<I>(&self, items: Option<I>) -> Result<(), CollectionError>
    where
        I: IntoIterator<Item = T>,
    {
        let Some(items) = items else {
            crate::tandem_warn!("bulk add without a source collection");
            return Err(CollectionError::NullSource);
        };
        self.add_range(items);
        Ok(())
    }

    fn notify(&self, change: CollectionChange<T>) {
        if self.is_suppressed() {
            return;
        }
        tracing::trace!(
            target: targets::COLLECTION,
            added = change.added().len(),
            removed = change.removed().len(),
            reset = change.is_reset(),
            "collection changed"
        );
        self.collection_changed.emit(change);
    }
}

/// Suppresses per-item notifications for the lifetime of a bulk add.
///
/// Dropping the guard restores the previous suppression state and emits the
/// single `Reset`, whether the add completed or unwound.
struct BulkAdd<'a, T: Clone + Send + Sync + 'static> {
    list: &'a ObservableVec<T>,
    added: Vec<T>,
    was_suppressed: bool,
}

impl<'a, T: Clone + Send + Sync + 'static> BulkAdd<'a, T> {
    fn begin(list: &'a ObservableVec<T>) -> Self {
        let was_suppressed = list.suppressed.swap(true, Ordering::SeqCst);
        Self {
            list,
            added: Vec::new(),
            was_suppressed,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for BulkAdd<'_, T> {
    fn drop(&mut self) {
        self.list
            .suppressed
            .store(self.was_suppressed, Ordering::SeqCst);
        self.list.notify(CollectionChange::Reset {
            removed: Vec::new(),
            added: std::mem::take(&mut self.added),
        });
    }
}

impl<T> std::fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableVec")
            .field("len", &self.items.read().len())
            .field("suppressed", &self.suppressed.load(Ordering::SeqCst))
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Sequence<T> for ObservableVec<T> {
    fn snapshot(&self) -> Vec<T> {
        ObservableVec::snapshot(self)
    }

    fn len(&self) -> usize {
        ObservableVec::len(self)
    }

    fn collection_changed(&self) -> Option<&Signal<CollectionChange<T>>> {
        Some(&self.collection_changed)
    }
}

impl<T: Clone + Send + Sync + 'static> MutableSequence<T> for ObservableVec<T> {
    fn push(&self, item: T) {
        ObservableVec::push(self, item);
    }

    fn remove_where(&self, pred: &dyn Fn(&T) -> bool) -> Option<T> {
        ObservableVec::remove_where(self, |item| pred(item))
    }

    fn clear(&self) {
        ObservableVec::clear(self);
    }

    fn insert_all(&self, index: usize, items: Vec<T>) {
        self.splice_in(index, items);
    }

    fn replace_all(&self, items: Vec<T>) {
        ObservableVec::replace_all(self, items);
    }
}

impl<T: Clone + Send + Sync> Sequence<T> for RwLock<Vec<T>> {
    fn snapshot(&self) -> Vec<T> {
        self.read().clone()
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}

impl<T: Clone + Send + Sync> MutableSequence<T> for RwLock<Vec<T>> {
    fn push(&self, item: T) {
        self.write().push(item);
    }

    fn remove_where(&self, pred: &dyn Fn(&T) -> bool) -> Option<T> {
        let mut items = self.write();
        let index = items.iter().position(|item| pred(item))?;
        Some(items.remove(index))
    }

    fn clear(&self) {
        self.write().clear();
    }

    fn insert_all(&self, index: usize, items: Vec<T>) {
        let mut list = self.write();
        let index = index.min(list.len());
        list.splice(index..index, items);
    }

    fn replace_all(&self, items: Vec<T>) {
        *self.write() = items;
    }
}

static_assertions::assert_impl_all!(ObservableVec<String>: Send, Sync);
