//! Scenario tests for bidirectional collection mirroring.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use tandem::mirror::{BasicWrapper, CollectionMirror, MirrorConfig, Wrapper, wrap, wrap_all};
use tandem::MirrorError;
use tandem_core::{CollectionChange, MutableSequence, Notify, ObservableVec, Property, Signal};

struct Task {
    title: Property<String>,
    changed: Signal<&'static str>,
}

impl Task {
    fn new(title: &str) -> Arc<Self> {
        Arc::new(Self {
            title: Property::new(title.to_string()),
            changed: Signal::new(),
        })
    }

    fn retitle(&self, title: &str) {
        if self.title.set(title.to_string()) {
            self.changed.emit("Title");
        }
    }
}

impl Default for Task {
    fn default() -> Self {
        Self {
            title: Property::new("untitled".to_string()),
            changed: Signal::new(),
        }
    }
}

impl Notify for Task {
    fn property_changed(&self) -> &Signal<&'static str> {
        &self.changed
    }
}

type TaskWrapper = BasicWrapper<Task>;
type TaskMirror<B> = CollectionMirror<TaskWrapper, B>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn count_changes<T: Clone + Send + Sync + 'static>(list: &ObservableVec<T>) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    list.collection_changed.connect(move |_| {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });
    count
}

fn assert_consistent<B: MutableSequence<Arc<Task>> + 'static>(mirror: &TaskMirror<B>) {
    let wrappers = mirror.primary().snapshot();
    let models = mirror.backing().snapshot();
    assert_eq!(wrappers.len(), models.len(), "collections differ in length");
    for (wrapper, model) in wrappers.iter().zip(&models) {
        let bound = wrapper.model().expect("wrapper has a model");
        assert!(Arc::ptr_eq(&bound, model), "wrapper bound to a different model");
    }
}

#[test]
fn test_push_and_remove_scenario() {
    init_tracing();
    let m1 = Task::new("m1");
    let backing = Arc::new(ObservableVec::from_vec(vec![m1.clone()]));
    let mirror = CollectionMirror::new(backing.clone(), TaskWrapper::new, MirrorConfig::default());

    // Backing [m1], auto-fetch -> [w1].
    assert_eq!(mirror.primary().len(), 1);
    assert_consistent(&mirror);

    // backing.push(m2) -> [w1, w2].
    let m2 = Task::new("m2");
    backing.push(m2.clone());
    assert_eq!(mirror.primary().len(), 2);
    assert!(mirror.wrapper_for(&m2).is_some());
    assert_consistent(&mirror);

    // primary.remove_at(0) -> backing [m2].
    mirror.primary().remove_at(0);
    assert_eq!(backing.len(), 1);
    assert!(Arc::ptr_eq(&backing.snapshot()[0], &m2));
    assert!(mirror.wrapper_for(&m1).is_none());
    assert_consistent(&mirror);
}

#[test]
fn test_one_notification_per_mutation() {
    init_tracing();
    let backing = Arc::new(ObservableVec::from_vec(vec![Task::new("a")]));
    let mirror = CollectionMirror::new(backing.clone(), TaskWrapper::new, MirrorConfig::default());
    let primary_events = count_changes(mirror.primary());
    let backing_events = count_changes(&backing);

    backing.push(Task::new("b"));
    assert_eq!(backing_events.load(Ordering::SeqCst), 1);
    assert_eq!(primary_events.load(Ordering::SeqCst), 1);

    mirror.add_new().unwrap();
    assert_eq!(primary_events.load(Ordering::SeqCst), 2);
    assert_eq!(backing_events.load(Ordering::SeqCst), 2);

    mirror.primary().remove_at(1);
    assert_eq!(primary_events.load(Ordering::SeqCst), 3);
    assert_eq!(backing_events.load(Ordering::SeqCst), 3);

    assert!(!mirror.is_suppressed());
    assert_consistent(&mirror);
}

#[test]
fn test_primary_run_reaches_backing_as_one_change() {
    init_tracing();
    let backing: Arc<ObservableVec<Arc<Task>>> = Arc::new(ObservableVec::new());
    let mirror = CollectionMirror::new(backing.clone(), TaskWrapper::new, MirrorConfig::default());
    let changes = Arc::new(Mutex::new(Vec::new()));
    let changes_clone = changes.clone();
    backing.collection_changed.connect(move |change: &CollectionChange<Arc<Task>>| {
        changes_clone.lock().push(change.added().len());
    });

    let wrappers = wrap_all(&TaskWrapper::new, [Task::new("a"), Task::new("b"), Task::new("c")]);
    mirror.primary().extend(wrappers);

    assert_eq!(*changes.lock(), vec![3]);
    assert_consistent(&mirror);
}

#[test]
fn test_inserts_keep_positions_on_both_sides() {
    let (a, z) = (Task::new("a"), Task::new("z"));
    let backing = Arc::new(ObservableVec::from_vec(vec![a, z]));
    let mirror = CollectionMirror::new(backing.clone(), TaskWrapper::new, MirrorConfig::default());

    // Primary -> backing.
    let head = Task::new("head");
    mirror.primary().insert(0, wrap(&TaskWrapper::new, head.clone())).unwrap();
    assert!(Arc::ptr_eq(&backing.snapshot()[0], &head));
    assert_consistent(&mirror);

    // Backing -> primary.
    let middle = Task::new("middle");
    backing.insert(2, middle.clone()).unwrap();
    let wrapper = mirror.primary().get(2).unwrap();
    assert!(Arc::ptr_eq(&wrapper.model().unwrap(), &middle));
    assert_consistent(&mirror);

    backing.insert_range(1, [Task::new("b"), Task::new("c")]).unwrap();
    assert_eq!(mirror.primary().len(), 6);
    assert_consistent(&mirror);
}

#[test]
fn test_plain_backing_receives_inserts_in_place() {
    let backing = Arc::new(RwLock::new(vec![Task::new("a"), Task::new("c")]));
    let mirror = CollectionMirror::new(backing.clone(), TaskWrapper::new, MirrorConfig::default());

    let b = Task::new("b");
    mirror.primary().insert(1, wrap(&TaskWrapper::new, b.clone())).unwrap();

    assert!(Arc::ptr_eq(&backing.read()[1], &b));
    assert_consistent(&mirror);
}

#[test]
fn test_backing_bulk_add_rebuilds_primary_once() {
    init_tracing();
    let backing = Arc::new(ObservableVec::from_vec(vec![Task::new("a")]));
    let mirror = CollectionMirror::new(backing.clone(), TaskWrapper::new, MirrorConfig::default());

    let resets = Arc::new(Mutex::new(Vec::new()));
    let resets_clone = resets.clone();
    mirror.primary().collection_changed.connect(move |change| {
        resets_clone.lock().push(change.is_reset());
    });

    backing.add_range([Task::new("b"), Task::new("c"), Task::new("d")]);

    assert_eq!(*resets.lock(), vec![true]);
    assert_eq!(mirror.primary().len(), 4);
    assert_consistent(&mirror);
}

#[test]
fn test_primary_clear_clears_backing() {
    let backing = Arc::new(ObservableVec::from_vec(vec![Task::new("a"), Task::new("b")]));
    let mirror = CollectionMirror::new(backing.clone(), TaskWrapper::new, MirrorConfig::default());

    let changes = Arc::new(Mutex::new(Vec::new()));
    let changes_clone = changes.clone();
    backing.collection_changed.connect(move |change: &CollectionChange<Arc<Task>>| {
        changes_clone.lock().push(change.is_reset());
    });

    mirror.primary().clear();
    assert!(backing.is_empty());
    assert_eq!(*changes.lock(), vec![true]);
}

#[test]
fn test_removing_unknown_model_is_a_no_op() {
    let shared = Task::new("shared");
    let backing = Arc::new(RwLock::new(vec![shared.clone()]));
    let mirror = CollectionMirror::new(backing.clone(), TaskWrapper::new, MirrorConfig::default());

    // The plain backing collection changes behind the mirror's back.
    backing.write().clear();

    let removed = mirror.primary().remove_at(0);
    assert!(removed.is_some());
    assert!(backing.read().is_empty());
    assert!(mirror.primary().is_empty());
}

#[test]
fn test_equal_models_are_distinct_entries() {
    let first = Task::new("same");
    let second = Task::new("same");
    let backing = Arc::new(ObservableVec::from_vec(vec![first.clone(), second.clone()]));
    let mirror = CollectionMirror::new(backing.clone(), TaskWrapper::new, MirrorConfig::default());

    backing.remove_where(|model| Arc::ptr_eq(model, &second));
    assert_eq!(mirror.primary().len(), 1);
    assert!(mirror.wrapper_for(&first).is_some());
    assert!(mirror.wrapper_for(&second).is_none());
}

#[test]
fn test_wrappers_forward_model_changes() {
    let model = Task::new("draft");
    let backing = Arc::new(ObservableVec::from_vec(vec![model.clone()]));
    let mirror = CollectionMirror::new(backing, TaskWrapper::new, MirrorConfig::default());
    let wrapper = mirror.wrapper_for(&model).unwrap();

    let names = Arc::new(Mutex::new(Vec::new()));
    let names_clone = names.clone();
    wrapper.property_changed().connect(move |&name| names_clone.lock().push(name));

    model.retitle("final");
    assert_eq!(*names.lock(), vec!["Title"]);
}

#[test]
fn test_detached_mirror_stops_propagating() {
    let backing = Arc::new(ObservableVec::from_vec(vec![Task::new("a")]));
    let mirror = CollectionMirror::new(backing.clone(), TaskWrapper::new, MirrorConfig::default());

    mirror.detach();
    assert!(!mirror.is_attached());
    assert_eq!(mirror.add_new().unwrap_err(), MirrorError::Detached);

    backing.push(Task::new("b"));
    assert_eq!(mirror.primary().len(), 1);
}

#[test]
fn test_dropping_mirror_disconnects_backing() {
    let backing = Arc::new(ObservableVec::from_vec(vec![Task::new("a")]));
    let before = backing.collection_changed.connection_count();
    {
        let _mirror = CollectionMirror::new(backing.clone(), TaskWrapper::new, MirrorConfig::default());
        assert_eq!(backing.collection_changed.connection_count(), before + 1);
    }
    assert_eq!(backing.collection_changed.connection_count(), before);
}
