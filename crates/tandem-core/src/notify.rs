//! Object-level change notification and dynamic property access.
//!
//! These traits are the narrow seams the mirror and the selection aggregator
//! talk through:
//!
//! - [`Notify`]: an object that announces changes to its named properties
//! - [`Selectable`]: a [`Notify`] object with a boolean selection flag
//! - [`Resolvable`]: an object whose properties can be looked up by name
//!
//! `Resolvable` is normally derived with `#[derive(Resolvable)]` from the
//! `tandem-macros` crate rather than written by hand.

use crate::signal::Signal;
use crate::value::PropertyValue;

/// An object that emits the name of a property whenever that property changes.
pub trait Notify: Send + Sync {
    /// The signal emitted with the changed property's name.
    fn property_changed(&self) -> &Signal<&'static str>;
}

/// An object carrying a boolean selection flag.
///
/// Implementations use interior mutability and are expected to emit
/// [`Notify::property_changed`] when the flag actually changes.
pub trait Selectable: Notify {
    /// Whether the object is currently selected.
    fn is_selected(&self) -> bool;

    /// Set the selection flag.
    fn set_selected(&self, selected: bool);
}

/// An object whose properties can be read by name at runtime.
///
/// This is the single dynamic-typing boundary used by group path resolution.
pub trait Resolvable: Send + Sync {
    /// The concrete type's name, used in diagnostics.
    fn type_name(&self) -> &'static str;

    /// Look up a property by name.
    ///
    /// Returns `None` when the type has no property of that name. A property
    /// that exists but holds no value returns `Some(PropertyValue::Null)`.
    fn property(&self, name: &str) -> Option<PropertyValue>;

    /// The names of every property exposed through [`property`](Self::property).
    fn property_names(&self) -> &'static [&'static str];

    /// The object's change signal, if it announces property changes.
    fn change_signal(&self) -> Option<&Signal<&'static str>> {
        None
    }

    /// Returns `true` if the type exposes a property of this name.
    fn has_property(&self, name: &str) -> bool {
        self.property_names().contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Property;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Row {
        selected: Property<bool>,
        label: Property<String>,
        changed: Signal<&'static str>,
    }

    impl Notify for Row {
        fn property_changed(&self) -> &Signal<&'static str> {
            &self.changed
        }
    }

    impl Selectable for Row {
        fn is_selected(&self) -> bool {
            self.selected.get()
        }

        fn set_selected(&self, selected: bool) {
            if self.selected.set(selected) {
                self.changed.emit("selected");
            }
        }
    }

    impl Resolvable for Row {
        fn type_name(&self) -> &'static str {
            "Row"
        }

        fn property(&self, name: &str) -> Option<PropertyValue> {
            match name {
                "selected" => Some(PropertyValue::Bool(self.selected.get())),
                "label" => Some(PropertyValue::String(self.label.get())),
                _ => None,
            }
        }

        fn property_names(&self) -> &'static [&'static str] {
            &["selected", "label"]
        }

        fn change_signal(&self) -> Option<&Signal<&'static str>> {
            Some(&self.changed)
        }
    }

    fn row() -> Row {
        Row {
            selected: Property::new(false),
            label: Property::new("a".into()),
            changed: Signal::new(),
        }
    }

    #[test]
    fn test_selectable_emits_only_on_change() {
        let row = row();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        row.property_changed().connect(move |&name| {
            assert_eq!(name, "selected");
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        row.set_selected(true);
        row.set_selected(true);
        row.set_selected(false);

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolvable_lookup() {
        let row = row();
        assert_eq!(row.property("label"), Some(PropertyValue::String("a".into())));
        assert_eq!(row.property("missing"), None);
        assert!(row.has_property("selected"));
        assert!(!row.has_property("Selected"));
        assert!(row.change_signal().is_some());
    }
}
