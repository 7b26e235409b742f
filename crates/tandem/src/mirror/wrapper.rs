//! Wrappers around model objects.
//!
//! A wrapper owns exactly one shared model and can be rebound to another one.
//! [`BasicWrapper`] is a ready-made implementation that re-emits the model's
//! property-change notifications as its own, minus any names placed on its
//! exclusion list.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tandem_core::{ConnectionId, Notify, Signal};

use crate::logging::targets;

/// An object that presents a single underlying model.
pub trait Wrapper: Send + Sync + 'static {
    /// The wrapped model type.
    type Model: Send + Sync + 'static;

    /// The currently bound model, if any.
    fn model(&self) -> Option<Arc<Self::Model>>;

    /// Bind to `model`, releasing whatever was bound before.
    fn set_model(&self, model: Arc<Self::Model>);
}

/// Creates unbound wrapper instances.
///
/// Any `Fn() -> W` closure is a factory.
pub trait WrapperFactory<W>: Send + Sync {
    /// Create a new wrapper with no model bound yet.
    fn create(&self) -> W;
}

impl<W, F> WrapperFactory<W> for F
where
    F: Fn() -> W + Send + Sync,
{
    fn create(&self) -> W {
        self()
    }
}

/// Create a wrapper and bind it to `model`.
pub fn wrap<W: Wrapper>(factory: &dyn WrapperFactory<W>, model: Arc<W::Model>) -> Arc<W> {
    let wrapper = factory.create();
    wrapper.set_model(model);
    Arc::new(wrapper)
}

/// Wrap every model in order, one fresh wrapper per model.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tandem::mirror::{BasicWrapper, Wrapper, wrap_all};
/// use tandem_core::{Notify, Signal};
///
/// #[derive(Default)]
/// struct Note { changed: Signal<&'static str> }
///
/// impl Notify for Note {
///     fn property_changed(&self) -> &Signal<&'static str> { &self.changed }
/// }
///
/// let models = vec![Arc::new(Note::default()), Arc::new(Note::default())];
/// let wrappers = wrap_all(&BasicWrapper::<Note>::new, models.clone());
/// assert!(Arc::ptr_eq(&wrappers[1].model().unwrap(), &models[1]));
/// ```
pub fn wrap_all<W, I>(factory: &dyn WrapperFactory<W>, models: I) -> Vec<Arc<W>>
where
    W: Wrapper,
    I: IntoIterator<Item = Arc<W::Model>>,
{
    models.into_iter().map(|model| wrap(factory, model)).collect()
}

/// A wrapper that forwards its model's change notifications.
///
/// Names passed to [`exclude_from_propagation`](Self::exclude_from_propagation)
/// are not forwarded. The exclusion list belongs to the current binding:
/// [`set_model`](Wrapper::set_model) clears it.
pub struct BasicWrapper<M: Notify + 'static> {
    model: RwLock<Option<Arc<M>>>,
    connection: Mutex<Option<ConnectionId>>,
    excluded: Arc<RwLock<HashSet<String>>>,
    changed: Arc<Signal<&'static str>>,
}

impl<M: Notify + 'static> Default for BasicWrapper<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Notify + 'static> BasicWrapper<M> {
    /// Create an unbound wrapper.
    pub fn new() -> Self {
        Self {
            model: RwLock::new(None),
            connection: Mutex::new(None),
            excluded: Arc::new(RwLock::new(HashSet::new())),
            changed: Arc::new(Signal::new()),
        }
    }

    /// Create a wrapper bound to `model`.
    pub fn with_model(model: Arc<M>) -> Self {
        let wrapper = Self::new();
        wrapper.bind(model);
        wrapper
    }

    /// Stop forwarding changes of `name` from the model.
    pub fn exclude_from_propagation(&self, name: impl Into<String>) {
        self.excluded.write().insert(name.into());
    }

    /// Resume forwarding changes of `name` from the model.
    pub fn include_in_propagation(&self, name: &str) -> bool {
        self.excluded.write().remove(name)
    }

    /// Returns `true` if model changes of `name` are forwarded.
    pub fn is_propagated(&self, name: &str) -> bool {
        !self.excluded.read().contains(name)
    }

    /// Announce a change of one of the wrapper's own properties.
    pub fn notify_changed(&self, name: &'static str) {
        self.changed.emit(name);
    }

    fn bind(&self, model: Arc<M>) {
        self.unbind();
        self.excluded.write().clear();

        let forward = Arc::clone(&self.changed);
        let excluded = Arc::clone(&self.excluded);
        let id = model.property_changed().connect(move |&name| {
            if excluded.read().contains(name) {
                tracing::trace!(target: targets::MIRROR, property = name, "change not propagated");
                return;
            }
            forward.emit(name);
        });

        *self.connection.lock() = Some(id);
        *self.model.write() = Some(model);
    }

    fn unbind(&self) {
        let previous = self.model.write().take();
        let id = self.connection.lock().take();
        if let (Some(model), Some(id)) = (previous, id) {
            model.property_changed().disconnect(id);
        }
    }
}

impl<M: Notify + 'static> Wrapper for BasicWrapper<M> {
    type Model = M;

    fn model(&self) -> Option<Arc<M>> {
        self.model.read().clone()
    }

    fn set_model(&self, model: Arc<M>) {
        self.bind(model);
    }
}

impl<M: Notify + 'static> Notify for BasicWrapper<M> {
    fn property_changed(&self) -> &Signal<&'static str> {
        &self.changed
    }
}

impl<M: Notify + 'static> Drop for BasicWrapper<M> {
    fn drop(&mut self) {
        self.unbind();
    }
}

impl<M: Notify + 'static> std::fmt::Debug for BasicWrapper<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicWrapper")
            .field("bound", &self.model.read().is_some())
            .field("excluded", &self.excluded.read().len())
            .finish()
    }
}
