//! Bidirectional collection mirroring.
//!
//! A [`CollectionMirror`] keeps a *primary* collection of wrapper objects in
//! step with a *backing* collection of the models they wrap. Structural
//! changes on either side are replayed on the other:
//!
//! | Change | Primary → backing | Backing → primary |
//! |---|---|---|
//! | Added | insert the models at the same index, as one run | wrap each model, insert at the same index as one run |
//! | Removed | remove each wrapper's model | remove the wrapper of each model |
//! | Reset | rebuild from primary order | rebuild every wrapper |
//!
//! While one side is being updated the mirror ignores the notifications that
//! update provokes, so each mutation crosses the mirror exactly once. Models
//! are matched by identity (`Arc::ptr_eq`), never by value.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tandem::mirror::{BasicWrapper, CollectionMirror, MirrorConfig, Wrapper};
//! use tandem_core::{Notify, ObservableVec, Signal};
//!
//! #[derive(Default)]
//! struct Task { changed: Signal<&'static str> }
//!
//! impl Notify for Task {
//!     fn property_changed(&self) -> &Signal<&'static str> { &self.changed }
//! }
//!
//! let backing = Arc::new(ObservableVec::from_vec(vec![Arc::new(Task::default())]));
//! let mirror = CollectionMirror::new(backing.clone(), BasicWrapper::<Task>::new, MirrorConfig::default());
//! assert_eq!(mirror.primary().len(), 1);
//!
//! backing.push(Arc::new(Task::default()));
//! assert_eq!(mirror.primary().len(), 2);
//!
//! mirror.primary().remove_at(0);
//! assert_eq!(backing.len(), 1);
//! ```

mod wrapper;

pub use wrapper::{BasicWrapper, Wrapper, WrapperFactory, wrap, wrap_all};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tandem_core::logging::{PerfSpan, span_names};
use tandem_core::{CollectionChange, ConnectionId, MutableSequence, ObservableVec};

use crate::error::MirrorError;
use crate::guard::FlagGuard;
use crate::logging::targets;

/// Configuration for a [`CollectionMirror`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Populate the primary collection from the backing one on construction.
    pub auto_fetch: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self { auto_fetch: true }
    }
}

impl MirrorConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the primary collection is populated on construction.
    pub fn with_auto_fetch(mut self, auto_fetch: bool) -> Self {
        self.auto_fetch = auto_fetch;
        self
    }
}

/// Keeps an observable collection of wrappers in step with a collection of models.
///
/// The mirror owns the primary collection. The backing collection is shared
/// and may be any [`MutableSequence`]; if it does not report changes, only
/// primary → backing propagation happens.
///
/// Dropping the mirror disconnects it from both collections.
pub struct CollectionMirror<W: Wrapper, B: MutableSequence<Arc<W::Model>> + 'static> {
    inner: Arc<MirrorInner<W, B>>,
}

struct MirrorInner<W: Wrapper, B> {
    primary: Arc<ObservableVec<Arc<W>>>,
    backing: Arc<B>,
    factory: Arc<dyn WrapperFactory<W>>,
    config: MirrorConfig,
    suppressed: AtomicBool,
    primary_connection: Mutex<Option<ConnectionId>>,
    backing_connection: Mutex<Option<ConnectionId>>,
}

impl<W, B> CollectionMirror<W, B>
where
    W: Wrapper,
    B: MutableSequence<Arc<W::Model>> + 'static,
{
    /// Mirror `backing`, creating wrappers with `factory`.
    ///
    /// Subscribes to both collections. With `auto_fetch` set, the primary
    /// collection is filled with one wrapper per backing model, in order.
    pub fn new<F>(backing: Arc<B>, factory: F, config: MirrorConfig) -> Self
    where
        F: WrapperFactory<W> + 'static,
    {
        let inner = Arc::new(MirrorInner {
            primary: Arc::new(ObservableVec::new()),
            backing,
            factory: Arc::new(factory),
            config,
            suppressed: AtomicBool::new(false),
            primary_connection: Mutex::new(None),
            backing_connection: Mutex::new(None),
        });

        let weak = Arc::downgrade(&inner);
        let primary_id = inner.primary.collection_changed.connect(move |change| {
            if let Some(inner) = Weak::upgrade(&weak) {
                inner.on_primary_changed(change);
            }
        });
        *inner.primary_connection.lock() = Some(primary_id);

        if let Some(signal) = inner.backing.collection_changed() {
            let weak = Arc::downgrade(&inner);
            let backing_id = signal.connect(move |change| {
                if let Some(inner) = Weak::upgrade(&weak) {
                    inner.on_backing_changed(change);
                }
            });
            *inner.backing_connection.lock() = Some(backing_id);
        } else {
            tracing::debug!(target: targets::MIRROR, "backing collection is not observable");
        }

        if config.auto_fetch {
            inner.resync_from_backing();
        }

        Self { inner }
    }

    /// The collection of wrappers.
    pub fn primary(&self) -> &Arc<ObservableVec<Arc<W>>> {
        &self.inner.primary
    }

    /// The collection of models.
    pub fn backing(&self) -> &Arc<B> {
        &self.inner.backing
    }

    /// The configuration the mirror was created with.
    pub fn config(&self) -> &MirrorConfig {
        &self.inner.config
    }

    /// Returns `true` while the mirror is applying a change to one side.
    pub fn is_suppressed(&self) -> bool {
        self.inner.is_suppressed()
    }

    /// Returns `true` until [`detach`](Self::detach) is called.
    pub fn is_attached(&self) -> bool {
        self.inner.primary_connection.lock().is_some()
    }

    /// Discard every wrapper and wrap each backing model afresh.
    ///
    /// Primary observers see a single `Reset`; nothing is written back to the
    /// backing collection.
    pub fn resync_from_backing(&self) {
        self.inner.resync_from_backing();
    }

    /// The wrapper bound to `model`, matched by identity.
    pub fn wrapper_for(&self, model: &Arc<W::Model>) -> Option<Arc<W>> {
        self.inner.wrapper_for(model)
    }

    /// Wrap `model`, append the wrapper to the primary collection and let the
    /// change flow to the backing collection.
    pub fn add_for_model(&self, model: Arc<W::Model>) -> Result<Arc<W>, MirrorError> {
        if !self.is_attached() {
            return Err(MirrorError::Detached);
        }
        let wrapper = wrap(&*self.inner.factory, model);
        self.inner.primary.push(Arc::clone(&wrapper));
        Ok(wrapper)
    }

    /// Create a default model and [`add_for_model`](Self::add_for_model) it.
    pub fn add_new(&self) -> Result<Arc<W>, MirrorError>
    where
        W::Model: Default,
    {
        self.add_for_model(Arc::new(W::Model::default()))
    }

    /// Disconnect from both collections. Further changes are not mirrored.
    pub fn detach(&self) {
        self.inner.detach();
    }
}

impl<W, B> Drop for CollectionMirror<W, B>
where
    W: Wrapper,
    B: MutableSequence<Arc<W::Model>> + 'static,
{
    fn drop(&mut self) {
        self.inner.detach();
    }
}

impl<W, B> MirrorInner<W, B>
where
    W: Wrapper,
    B: MutableSequence<Arc<W::Model>> + 'static,
{
    fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }

    fn wrapper_for(&self, model: &Arc<W::Model>) -> Option<Arc<W>> {
        let index = self.primary.position_where(|w| bound_to(w, model))?;
        self.primary.get(index)
    }

    fn resync_from_backing(&self) {
        let _span = PerfSpan::new(span_names::MIRROR_RESYNC);
        let _suppression = FlagGuard::raise(&self.suppressed);

        let wrappers = wrap_all(&*self.factory, self.backing.snapshot());
        tracing::debug!(target: targets::MIRROR, count = wrappers.len(), "rebuilt wrappers from backing");
        self.primary.replace_all(wrappers);
    }

    fn on_primary_changed(&self, change: &CollectionChange<Arc<W>>) {
        if self.is_suppressed() {
            return;
        }
        let _suppression = FlagGuard::raise(&self.suppressed);

        match change {
            CollectionChange::Added { index, items } => {
                let models: Vec<Arc<W::Model>> = items
                    .iter()
                    .filter_map(|wrapper| {
                        let model = wrapper.model();
                        if model.is_none() {
                            tracing::warn!(target: targets::MIRROR, "added wrapper has no model, not mirrored");
                        }
                        model
                    })
                    .collect();
                self.backing.insert_all(*index, models);
            }
            CollectionChange::Removed { items, .. } => {
                for wrapper in items {
                    let Some(model) = wrapper.model() else {
                        continue;
                    };
                    if self
                        .backing
                        .remove_where(&|candidate: &Arc<W::Model>| Arc::ptr_eq(candidate, &model))
                        .is_none()
                    {
                        tracing::trace!(target: targets::MIRROR, "removed wrapper's model not in backing");
                    }
                }
            }
            CollectionChange::Reset { .. } => {
                let models: Vec<Arc<W::Model>> = self
                    .primary
                    .snapshot()
                    .iter()
                    .filter_map(|wrapper| wrapper.model())
                    .collect();
                self.backing.replace_all(models);
            }
        }
        tracing::trace!(target: targets::MIRROR, "primary change mirrored to backing");
    }

    fn on_backing_changed(&self, change: &CollectionChange<Arc<W::Model>>) {
        if self.is_suppressed() {
            return;
        }
        let _suppression = FlagGuard::raise(&self.suppressed);

        match change {
            CollectionChange::Added { index, items } => {
                let wrappers = wrap_all(&*self.factory, items.iter().cloned());
                MutableSequence::insert_all(&*self.primary, *index, wrappers);
            }
            CollectionChange::Removed { items, .. } => {
                for model in items {
                    if self.primary.remove_where(|w| bound_to(w, model)).is_none() {
                        tracing::trace!(target: targets::MIRROR, "removed model has no wrapper, nothing to do");
                    }
                }
            }
            CollectionChange::Reset { .. } => self.resync_from_backing(),
        }
        tracing::trace!(target: targets::MIRROR, "backing change mirrored to primary");
    }

    fn detach(&self) {
        if let Some(id) = self.primary_connection.lock().take() {
            self.primary.collection_changed.disconnect(id);
        }
        if let Some(id) = self.backing_connection.lock().take()
            && let Some(signal) = self.backing.collection_changed()
        {
            signal.disconnect(id);
        }
    }
}

fn bound_to<W: Wrapper>(wrapper: &Arc<W>, model: &Arc<W::Model>) -> bool {
    wrapper
        .model()
        .is_some_and(|bound| Arc::ptr_eq(&bound, model))
}
