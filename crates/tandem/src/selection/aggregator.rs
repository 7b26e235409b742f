//! Group-scoped tri-state selection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tandem_core::logging::{PerfSpan, span_names};
use tandem_core::{
    CheckState, CollectionChange, ConnectionId, IntoPropertyValue, PathError, Resolvable,
    Selectable, Sequence, Signal,
};

use super::config::{EmptyGroupPolicy, SelectorConfig};
use super::control::TriStateControl;
use super::path::{GroupPath, Resolution, resolve};
use crate::error::SelectionError;
use crate::guard::FlagGuard;
use crate::logging::targets;

/// Aggregates the selection flags of a group of items into one tri-state
/// value and keeps a [`TriStateControl`] in step with it.
///
/// Every item of the source collection is watched. Without a group path each
/// item is *tracked*; with one, an item is tracked while the value at the path
/// equals the group key. Changes anywhere along an item's path re-evaluate its
/// membership, so items leave and rejoin the group without re-initialization.
///
/// Toggling the control to `Checked` or `Unchecked` sets every tracked item's
/// flag and recomputes once. `PartiallyChecked` is only ever written by the
/// aggregator.
///
/// # Signals
///
/// - `aggregate_recomputed(CheckState)`: Emitted after every recomputation
/// - `aggregate_changed(CheckState)`: Emitted when the aggregate changes
/// - `configuration_error(SelectionError)`: Emitted when a change observed
///   inside a handler cannot be applied
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tandem::selection::{SelectionAggregator, SelectorConfig, TriStateCheckBox, TriStateControl};
/// use tandem_core::{CheckState, ObservableVec, Property, Selectable, Signal};
/// use tandem_macros::Resolvable;
///
/// #[derive(Resolvable)]
/// #[resolvable(notify = "changed")]
/// struct Row {
///     #[property(name = "IsSelected")]
///     selected: Property<bool>,
///     changed: Signal<&'static str>,
/// }
///
/// impl Selectable for Row {
///     fn is_selected(&self) -> bool { self.selected.get() }
///     fn set_selected(&self, selected: bool) {
///         if self.selected.set(selected) {
///             self.changed.emit("IsSelected");
///         }
///     }
/// }
///
/// let row = |selected| Arc::new(Row { selected: Property::new(selected), changed: Signal::new() });
/// let rows = Arc::new(ObservableVec::from_vec(vec![row(true), row(false)]));
/// let check_box = Arc::new(TriStateCheckBox::new());
///
/// let aggregator = SelectionAggregator::<Row>::new(SelectorConfig::new());
/// let state = aggregator.attach(rows.clone(), check_box.clone()).unwrap();
/// assert_eq!(state, CheckState::PartiallyChecked);
/// assert_eq!(check_box.check_state(), CheckState::PartiallyChecked);
///
/// check_box.click();
/// assert!(rows.snapshot().iter().all(|row| !row.is_selected()));
/// ```
pub struct SelectionAggregator<T: Selectable + Resolvable + 'static> {
    inner: Arc<AggregatorInner<T>>,
}

struct AggregatorInner<T: Selectable + Resolvable + 'static> {
    state: Mutex<State<T>>,
    /// Raised while the aggregator writes item flags itself.
    stop_change_event: AtomicBool,
    /// Raised while the aggregator writes the control.
    syncing_control: AtomicBool,
    aggregate_recomputed: Signal<CheckState>,
    aggregate_changed: Signal<CheckState>,
    configuration_error: Signal<SelectionError>,
}

struct State<T> {
    config: SelectorConfig,
    path: Option<GroupPath>,
    attached: bool,
    source: Option<Arc<dyn Sequence<Arc<T>>>>,
    control: Option<Arc<dyn TriStateControl>>,
    source_connection: Option<(Arc<dyn Sequence<Arc<T>>>, ConnectionId)>,
    control_connection: Option<(Arc<dyn TriStateControl>, ConnectionId)>,
    watched: Vec<Watch<T>>,
    aggregate: CheckState,
}

impl<T> State<T> {
    fn position(&self, item: &Arc<T>) -> Option<usize> {
        self.watched
            .iter()
            .position(|watch| Arc::ptr_eq(&watch.item, item))
    }

    fn is_member(&self, item: &Arc<T>) -> bool {
        self.position(item)
            .is_some_and(|index| self.watched[index].member)
    }

    fn members(&self) -> Vec<Arc<T>> {
        self.watched
            .iter()
            .filter(|watch| watch.member)
            .map(|watch| Arc::clone(&watch.item))
            .collect()
    }
}

/// The subscriptions held for one source item.
struct Watch<T> {
    item: Arc<T>,
    member: bool,
    own: ConnectionId,
    chain: Vec<(Arc<dyn Resolvable>, ConnectionId)>,
}

impl<T: Selectable> Watch<T> {
    fn disconnect(&self) {
        self.item.property_changed().disconnect(self.own);
        for (link, id) in &self.chain {
            if let Some(signal) = link.change_signal() {
                signal.disconnect(*id);
            }
        }
    }
}

impl<T: Selectable + Resolvable + 'static> Default for SelectionAggregator<T> {
    fn default() -> Self {
        Self::new(SelectorConfig::default())
    }
}

impl<T: Selectable + Resolvable + 'static> SelectionAggregator<T> {
    /// Create a detached aggregator.
    ///
    /// The group path is validated when the aggregator is attached.
    pub fn new(config: SelectorConfig) -> Self {
        let path = config.parsed_path().ok().flatten();
        let aggregate = config.empty_policy.state();
        Self {
            inner: Arc::new(AggregatorInner {
                state: Mutex::new(State {
                    config,
                    path,
                    attached: false,
                    source: None,
                    control: None,
                    source_connection: None,
                    control_connection: None,
                    watched: Vec::new(),
                    aggregate,
                }),
                stop_change_event: AtomicBool::new(false),
                syncing_control: AtomicBool::new(false),
                aggregate_recomputed: Signal::new(),
                aggregate_changed: Signal::new(),
                configuration_error: Signal::new(),
            }),
        }
    }

    /// Attach a source collection and a control, then initialize.
    ///
    /// Returns the initial aggregate. On error the aggregator stays attached,
    /// so a later configuration change re-runs initialization.
    pub fn attach<S, C>(&self, source: Arc<S>, control: Arc<C>) -> Result<CheckState, SelectionError>
    where
        S: Sequence<Arc<T>> + 'static,
        C: TriStateControl + 'static,
    {
        let source: Arc<dyn Sequence<Arc<T>>> = source;
        let control: Arc<dyn TriStateControl> = control;
        {
            let mut state = self.inner.state.lock();
            state.source = Some(source);
            state.control = Some(control);
            state.attached = true;
        }
        self.inner.init()
    }

    /// Drop every subscription and release the source and control.
    pub fn detach(&self) {
        self.inner.detach();
    }

    /// Returns `true` between [`attach`](Self::attach) and [`detach`](Self::detach).
    pub fn is_attached(&self) -> bool {
        self.inner.state.lock().attached
    }

    /// Replace the source collection, re-initializing when attached.
    pub fn set_source<S>(&self, source: Arc<S>) -> Result<(), SelectionError>
    where
        S: Sequence<Arc<T>> + 'static,
    {
        let source: Arc<dyn Sequence<Arc<T>>> = source;
        let attached = {
            let mut state = self.inner.state.lock();
            state.source = Some(source);
            state.attached
        };
        self.inner.reinit_if(attached)
    }

    /// Replace the control, re-initializing when attached.
    pub fn set_control<C>(&self, control: Arc<C>) -> Result<(), SelectionError>
    where
        C: TriStateControl + 'static,
    {
        let control: Arc<dyn TriStateControl> = control;
        let attached = {
            let mut state = self.inner.state.lock();
            state.control = Some(control);
            state.attached
        };
        self.inner.reinit_if(attached)
    }

    /// Change the group path, re-initializing when attached.
    ///
    /// The path is validated immediately; an invalid path leaves the current
    /// configuration in place.
    pub fn set_group_path(&self, path: Option<String>) -> Result<(), SelectionError> {
        let parsed = match path.as_deref() {
            Some(text) => Some(GroupPath::parse(text).map_err(SelectionError::InvalidGroupPath)?),
            None => None,
        };
        let attached = {
            let mut state = self.inner.state.lock();
            state.config.group_path = path;
            state.path = parsed;
            state.attached
        };
        self.inner.reinit_if(attached)
    }

    /// Change the group key, re-initializing when attached.
    pub fn set_group_key(&self, key: impl IntoPropertyValue) -> Result<(), SelectionError> {
        let attached = {
            let mut state = self.inner.state.lock();
            state.config.group_key = Some(key.into_property_value());
            state.attached
        };
        self.inner.reinit_if(attached)
    }

    /// Change what an empty group reads as, recomputing when attached.
    pub fn set_empty_policy(&self, policy: EmptyGroupPolicy) -> Result<(), SelectionError> {
        let attached = {
            let mut state = self.inner.state.lock();
            state.config.empty_policy = policy;
            state.attached
        };
        if attached {
            self.inner.recompute()?;
        }
        Ok(())
    }

    /// Start watching `item`.
    ///
    /// Returns `Ok(true)` if the item joined the group, `Ok(false)` if it was
    /// already watched or does not match the group key.
    pub fn add_item(&self, item: Arc<T>) -> Result<bool, SelectionError> {
        self.inner.add_item(item)
    }

    /// Stop watching `item`. Returns `true` if it was tracked.
    pub fn remove_item(&self, item: &Arc<T>) -> bool {
        self.inner.remove_item(item)
    }

    /// Recompute the aggregate from the tracked items and sync the control.
    pub fn recompute(&self) -> Result<CheckState, SelectionError> {
        self.inner.recompute()
    }

    /// Set every tracked item's flag, then recompute once.
    pub fn select_all(&self, selected: bool) -> Result<CheckState, SelectionError> {
        self.inner.select_all(selected)
    }

    /// The last computed aggregate.
    pub fn aggregate(&self) -> CheckState {
        self.inner.state.lock().aggregate
    }

    /// The tracked items, in the order they were added.
    pub fn tracked_items(&self) -> Vec<Arc<T>> {
        self.inner.state.lock().members()
    }

    /// The number of tracked items.
    pub fn tracked_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .watched
            .iter()
            .filter(|watch| watch.member)
            .count()
    }

    /// Returns `true` if `item` is currently in the group.
    pub fn is_tracked(&self, item: &Arc<T>) -> bool {
        self.inner.state.lock().is_member(item)
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> SelectorConfig {
        self.inner.state.lock().config.clone()
    }

    /// The parsed group path, if one is configured.
    pub fn group_path(&self) -> Option<GroupPath> {
        self.inner.state.lock().path.clone()
    }

    /// Signal emitted after every recomputation.
    pub fn aggregate_recomputed(&self) -> &Signal<CheckState> {
        &self.inner.aggregate_recomputed
    }

    /// Signal emitted when the aggregate changes value.
    pub fn aggregate_changed(&self) -> &Signal<CheckState> {
        &self.inner.aggregate_changed
    }

    /// Signal emitted with errors raised while handling change notifications.
    pub fn configuration_error(&self) -> &Signal<SelectionError> {
        &self.inner.configuration_error
    }
}

impl<T: Selectable + Resolvable + 'static> Drop for SelectionAggregator<T> {
    fn drop(&mut self) {
        self.inner.detach();
    }
}

impl<T: Selectable + Resolvable + 'static> std::fmt::Debug for SelectionAggregator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SelectionAggregator")
            .field("group_path", &state.config.group_path)
            .field("attached", &state.attached)
            .field("watched", &state.watched.len())
            .field("aggregate", &state.aggregate)
            .finish()
    }
}

impl<T: Selectable + Resolvable + 'static> AggregatorInner<T> {
    fn init(self: &Arc<Self>) -> Result<CheckState, SelectionError> {
        let _span = PerfSpan::new(span_names::SELECTION_INIT);
        self.teardown();

        let (source, control) = {
            let mut state = self.state.lock();
            let (Some(source), Some(control)) = (state.source.clone(), state.control.clone())
            else {
                return Err(SelectionError::NotAttached);
            };
            state.path = state
                .config
                .parsed_path()
                .map_err(SelectionError::InvalidGroupPath)?;
            (source, control)
        };

        if let Some(signal) = source.collection_changed() {
            let weak = Arc::downgrade(self);
            let id = signal.connect(move |change| {
                if let Some(inner) = Weak::upgrade(&weak) {
                    inner.on_source_changed(change);
                }
            });
            self.state.lock().source_connection = Some((Arc::clone(&source), id));
        } else {
            tracing::debug!(target: targets::SELECTION, "items source is not observable");
        }

        for item in source.snapshot() {
            self.add_item(item)?;
        }

        let weak = Arc::downgrade(self);
        let id = control.state_changed().connect(move |&state| {
            if let Some(inner) = Weak::upgrade(&weak) {
                inner.on_control_changed(state);
            }
        });
        self.state.lock().control_connection = Some((control, id));

        let aggregate = self.recompute()?;
        tracing::debug!(
            target: targets::SELECTION,
            watched = self.state.lock().watched.len(),
            ?aggregate,
            "selection aggregator initialized"
        );
        Ok(aggregate)
    }

    fn reinit_if(self: &Arc<Self>, attached: bool) -> Result<(), SelectionError> {
        if attached {
            self.init()?;
        }
        Ok(())
    }

    fn teardown(&self) {
        let (watched, source_connection, control_connection) = {
            let mut state = self.state.lock();
            (
                std::mem::take(&mut state.watched),
                state.source_connection.take(),
                state.control_connection.take(),
            )
        };
        for watch in &watched {
            watch.disconnect();
        }
        if let Some((source, id)) = source_connection
            && let Some(signal) = source.collection_changed()
        {
            signal.disconnect(id);
        }
        if let Some((control, id)) = control_connection {
            control.state_changed().disconnect(id);
        }
    }

    fn detach(&self) {
        self.teardown();
        let mut state = self.state.lock();
        state.attached = false;
        state.source = None;
        state.control = None;
    }

    fn add_item(self: &Arc<Self>, item: Arc<T>) -> Result<bool, SelectionError> {
        let (path, key) = {
            let state = self.state.lock();
            if state.position(&item).is_some() {
                return Ok(false);
            }
            (state.path.clone(), state.config.key())
        };

        let (member, chain) = match &path {
            None => (true, Vec::new()),
            Some(path) => match resolve(item.as_ref(), path) {
                Ok(Resolution::Resolved { chain, value }) => (value == key, chain),
                Ok(Resolution::Unresolved { chain }) => (false, chain),
                Err(source) => return Err(missing_group_property(item.as_ref(), path, source)),
            },
        };

        let own = {
            let weak = Arc::downgrade(self);
            let weak_item = Arc::downgrade(&item);
            item.property_changed().connect(move |&name| {
                if let (Some(inner), Some(item)) = (weak.upgrade(), weak_item.upgrade()) {
                    inner.on_item_changed(&item, name);
                }
            })
        };
        let chain = chain
            .into_iter()
            .filter_map(|link| {
                let weak = Arc::downgrade(self);
                let weak_item = Arc::downgrade(&item);
                let id = link.change_signal()?.connect(move |_| {
                    if let (Some(inner), Some(item)) = (weak.upgrade(), weak_item.upgrade()) {
                        inner.on_chain_changed(&item);
                    }
                });
                Some((link, id))
            })
            .collect();

        let watch = Watch {
            item,
            member,
            own,
            chain,
        };
        let mut state = self.state.lock();
        if state.position(&watch.item).is_some() {
            // Added by a handler that ran while this item was being resolved.
            drop(state);
            watch.disconnect();
            return Ok(false);
        }
        tracing::trace!(
            target: targets::SELECTION,
            member,
            chain = watch.chain.len(),
            "watching item"
        );
        state.watched.push(watch);
        Ok(member)
    }

    fn remove_item(&self, item: &Arc<T>) -> bool {
        let watch = {
            let mut state = self.state.lock();
            match state.position(item) {
                Some(index) => state.watched.remove(index),
                None => return false,
            }
        };
        watch.disconnect();
        watch.member
    }

    /// Remove and re-add `item`. Returns whether it is now tracked.
    fn reevaluate(self: &Arc<Self>, item: &Arc<T>) -> Result<bool, SelectionError> {
        self.remove_item(item);
        self.add_item(Arc::clone(item))
    }

    fn recompute(&self) -> Result<CheckState, SelectionError> {
        let _span = PerfSpan::new(span_names::SELECTION_RECOMPUTE);
        let (members, path, policy, control) = {
            let state = self.state.lock();
            (
                state.members(),
                state.path.clone(),
                state.config.empty_policy,
                state.control.clone(),
            )
        };

        if let Some(path) = &path {
            for item in &members {
                resolve(item.as_ref(), path)
                    .map_err(|source| missing_group_property(item.as_ref(), path, source))?;
            }
        }

        let aggregate = CheckState::aggregate(members.iter().map(|item| item.is_selected()))
            .unwrap_or(policy.state());
        let previous = std::mem::replace(&mut self.state.lock().aggregate, aggregate);

        if let Some(control) = control
            && control.check_state() != aggregate
        {
            let _syncing = FlagGuard::raise(&self.syncing_control);
            control.set_check_state(aggregate);
        }

        tracing::trace!(
            target: targets::SELECTION,
            tracked = members.len(),
            ?aggregate,
            "aggregate recomputed"
        );
        self.aggregate_recomputed.emit(aggregate);
        if previous != aggregate {
            tracing::debug!(target: targets::SELECTION, ?previous, ?aggregate, "aggregate changed");
            self.aggregate_changed.emit(aggregate);
        }
        Ok(aggregate)
    }

    fn select_all(&self, selected: bool) -> Result<CheckState, SelectionError> {
        let members = self.state.lock().members();
        {
            let _stop = FlagGuard::raise(&self.stop_change_event);
            for item in &members {
                item.set_selected(selected);
            }
        }
        tracing::debug!(target: targets::SELECTION, selected, count = members.len(), "selection fanned out");
        self.recompute()
    }

    fn on_source_changed(self: &Arc<Self>, change: &CollectionChange<Arc<T>>) {
        match change {
            CollectionChange::Added { items, .. } => {
                for item in items {
                    if let Err(err) = self.add_item(Arc::clone(item)) {
                        self.report(err);
                    }
                }
            }
            CollectionChange::Removed { items, .. } => {
                for item in items {
                    self.remove_item(item);
                }
            }
            CollectionChange::Reset { .. } => self.reconcile_with_source(),
        }
        if let Err(err) = self.recompute() {
            self.report(err);
        }
    }

    fn reconcile_with_source(self: &Arc<Self>) {
        let Some(source) = self.state.lock().source.clone() else {
            return;
        };
        let current = source.snapshot();
        let stale: Vec<Arc<T>> = self
            .state
            .lock()
            .watched
            .iter()
            .filter(|watch| !current.iter().any(|item| Arc::ptr_eq(item, &watch.item)))
            .map(|watch| Arc::clone(&watch.item))
            .collect();
        for item in &stale {
            self.remove_item(item);
        }
        for item in current {
            if let Err(err) = self.add_item(item) {
                self.report(err);
            }
        }
    }

    fn on_item_changed(self: &Arc<Self>, item: &Arc<T>, name: &str) {
        if self.stop_change_event.load(Ordering::SeqCst) {
            return;
        }
        let (was_member, on_path) = {
            let state = self.state.lock();
            let on_path = state.path.as_ref().is_some_and(|path| path.first() == name);
            (state.is_member(item), on_path)
        };
        let is_member = if on_path {
            self.reevaluate_reporting(item)
        } else {
            was_member
        };
        if (was_member || is_member)
            && let Err(err) = self.recompute()
        {
            self.report(err);
        }
    }

    fn on_chain_changed(self: &Arc<Self>, item: &Arc<T>) {
        let was_member = self.state.lock().is_member(item);
        let is_member = self.reevaluate_reporting(item);
        if (was_member || is_member)
            && let Err(err) = self.recompute()
        {
            self.report(err);
        }
    }

    fn reevaluate_reporting(self: &Arc<Self>, item: &Arc<T>) -> bool {
        match self.reevaluate(item) {
            Ok(member) => member,
            Err(err) => {
                self.report(err);
                false
            }
        }
    }

    fn on_control_changed(&self, state: CheckState) {
        if self.syncing_control.load(Ordering::SeqCst) {
            return;
        }
        let Some(selected) = state.to_bool() else {
            tracing::trace!(target: targets::SELECTION, "partial control state ignored");
            return;
        };
        if let Err(err) = self.select_all(selected) {
            self.report(err);
        }
    }

    fn report(&self, err: SelectionError) {
        tracing::error!(target: targets::SELECTION, error = %err, "selection aggregator configuration error");
        self.configuration_error.emit(err);
    }
}

fn missing_group_property(item: &dyn Resolvable, path: &GroupPath, source: PathError) -> SelectionError {
    SelectionError::MissingGroupProperty {
        type_name: item.type_name(),
        path: path.to_string(),
        source,
    }
}
