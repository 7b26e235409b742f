//! Integration tests for the #[derive(Resolvable)] macro.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tandem_core::{Notify, Property, PropertyValue, Resolvable, Signal};
use tandem_macros::Resolvable;

#[derive(Resolvable)]
#[resolvable(notify = "changed")]
struct Region {
    #[property(name = "Name")]
    name: Property<String>,

    changed: Signal<&'static str>,
}

impl Region {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: Property::new(name.to_string()),
            changed: Signal::new(),
        })
    }

    fn set_name(&self, name: &str) {
        if self.name.set(name.to_string()) {
            self.changed.emit("Name");
        }
    }
}

#[derive(Resolvable)]
#[resolvable(notify = "changed", name = "Site")]
struct Office {
    #[property(name = "Region")]
    region: Property<Option<Arc<Region>>>,

    #[property]
    floors: u32,

    #[property(skip)]
    secret: String,

    untracked: bool,

    changed: Signal<&'static str>,
}

// No notify signal: a plain value object.
#[derive(Resolvable)]
struct Badge {
    #[property]
    code: String,
    #[property]
    active: Property<bool>,
}

fn office(region: Option<Arc<Region>>) -> Office {
    Office {
        region: Property::new(region),
        floors: 4,
        secret: "hidden".into(),
        untracked: true,
        changed: Signal::new(),
    }
}

#[test]
fn test_type_name() {
    assert_eq!(Region::new("north").type_name(), "Region");
    assert_eq!(office(None).type_name(), "Site");
    assert_eq!(
        Badge {
            code: "x".into(),
            active: Property::new(false)
        }
        .type_name(),
        "Badge"
    );
}

#[test]
fn test_property_lookup_by_name() {
    let region = Region::new("north");
    assert_eq!(
        region.property("Name"),
        Some(PropertyValue::String("north".into()))
    );
    // Lookups use the declared name, not the field name.
    assert_eq!(region.property("name"), None);
}

#[test]
fn test_property_names_in_declaration_order() {
    let office = office(None);
    assert_eq!(office.property_names(), &["Region", "floors"]);
    assert!(office.has_property("floors"));
    assert!(!office.has_property("secret"));
    assert!(!office.has_property("untracked"));
    assert_eq!(office.secret, "hidden");
    assert!(office.untracked);
}

#[test]
fn test_nested_object_and_null() {
    let region = Region::new("south");
    let with_region = office(Some(region.clone()));
    let without_region = office(None);

    let value = with_region.property("Region").unwrap();
    let nested = value.as_object().unwrap();
    assert_eq!(nested.type_name(), "Region");
    assert_eq!(
        nested.property("Name"),
        Some(PropertyValue::String("south".into()))
    );

    assert_eq!(without_region.property("Region"), Some(PropertyValue::Null));
    assert_eq!(with_region.property("floors"), Some(PropertyValue::Int(4)));
}

#[test]
fn test_notify_is_generated() {
    let region = Region::new("east");
    let count = Arc::new(AtomicUsize::new(0));

    let count_clone = count.clone();
    region.property_changed().connect(move |&name| {
        assert_eq!(name, "Name");
        count_clone.fetch_add(1, Ordering::SeqCst);
    });

    region.set_name("west");
    region.set_name("west");

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(region.change_signal().is_some());
}

#[test]
fn test_change_signal_absent_without_notify() {
    let badge = Badge {
        code: "A-1".into(),
        active: Property::new(true),
    };
    assert!(badge.change_signal().is_none());
    assert_eq!(badge.property("active"), Some(PropertyValue::Bool(true)));
    assert_eq!(badge.property("code"), Some(PropertyValue::String("A-1".into())));
}
