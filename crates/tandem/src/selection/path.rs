//! Dotted property paths and their resolution.
//!
//! A [`GroupPath`] such as `Address.Region.Name` names a property reached by
//! walking nested objects from a root item. [`resolve`] walks it and also
//! reports every intermediate object that announces changes, so callers can
//! watch the path for re-evaluation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tandem_core::{FromPropertyValue, PathError, PropertyValue, Resolvable};

/// A parsed, non-empty dotted property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupPath {
    segments: Vec<String>,
}

impl GroupPath {
    /// Parse `path`, splitting on `.`.
    ///
    /// An empty path, or one with an empty segment (`"A..B"`, `".A"`), is
    /// rejected with [`PathError::InvalidPath`].
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments: Vec<String> = path.split('.').map(str::to_owned).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(PathError::InvalidPath {
                path: path.to_owned(),
            });
        }
        Ok(Self { segments })
    }

    /// The segments in walk order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The first segment, read directly on the root item.
    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// The last segment, naming the compared property.
    pub fn terminal(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// The number of segments. Always at least one.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; a parsed path has at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for GroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for GroupPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The outcome of walking a [`GroupPath`].
///
/// In both variants `chain` lists, in path order, the objects reached after
/// the root that expose a change signal. The root itself is never included.
#[derive(Clone)]
pub enum Resolution {
    /// A non-terminal step held no object, so the path has no value yet.
    Unresolved {
        /// Watchable objects reached before the gap.
        chain: Vec<Arc<dyn Resolvable>>,
    },
    /// The terminal property was read.
    Resolved {
        /// Watchable objects along the path.
        chain: Vec<Arc<dyn Resolvable>>,
        /// The terminal property's value.
        value: PropertyValue,
    },
}

impl Resolution {
    /// The terminal value, if the path resolved.
    pub fn value(&self) -> Option<&PropertyValue> {
        match self {
            Resolution::Resolved { value, .. } => Some(value),
            Resolution::Unresolved { .. } => None,
        }
    }

    /// The watchable intermediates.
    pub fn chain(&self) -> &[Arc<dyn Resolvable>] {
        match self {
            Resolution::Resolved { chain, .. } | Resolution::Unresolved { chain } => chain,
        }
    }

    /// Returns `true` for [`Resolution::Resolved`].
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    /// Consume the resolution, keeping only the chain.
    pub fn into_chain(self) -> Vec<Arc<dyn Resolvable>> {
        match self {
            Resolution::Resolved { chain, .. } | Resolution::Unresolved { chain } => chain,
        }
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain: Vec<&'static str> = self.chain().iter().map(|link| link.type_name()).collect();
        match self {
            Resolution::Unresolved { .. } => f
                .debug_struct("Unresolved")
                .field("chain", &chain)
                .finish(),
            Resolution::Resolved { value, .. } => f
                .debug_struct("Resolved")
                .field("chain", &chain)
                .field("value", value)
                .finish(),
        }
    }
}

/// Walk `path` starting at `root`.
///
/// - A null value at a non-terminal step yields [`Resolution::Unresolved`].
/// - A name the object at that step does not expose, or a scalar where an
///   object is needed to continue, fails with [`PathError::MissingMember`].
pub fn resolve(root: &dyn Resolvable, path: &GroupPath) -> Result<Resolution, PathError> {
    let segments = path.segments();
    let last = segments.len() - 1;
    let mut chain: Vec<Arc<dyn Resolvable>> = Vec::new();
    let mut current: Option<Arc<dyn Resolvable>> = None;

    for (step, segment) in segments.iter().enumerate() {
        let value = {
            let object: &dyn Resolvable = current.as_deref().unwrap_or(root);
            object
                .property(segment)
                .ok_or_else(|| PathError::MissingMember {
                    type_name: object.type_name(),
                    member: segment.clone(),
                })?
        };

        if step == last {
            return Ok(Resolution::Resolved { chain, value });
        }

        match value {
            PropertyValue::Null => return Ok(Resolution::Unresolved { chain }),
            PropertyValue::Object(next) => {
                if next.change_signal().is_some() {
                    chain.push(Arc::clone(&next));
                }
                current = Some(next);
            }
            scalar => {
                return Err(PathError::MissingMember {
                    type_name: scalar.kind(),
                    member: segments[step + 1].clone(),
                });
            }
        }
    }

    // `segments` is never empty, so the loop always returns.
    Ok(Resolution::Unresolved { chain })
}

/// Lenient lookup: the value at `path`, or `None` if the path is invalid,
/// broken by a null, or names a missing member. Null terminal values are also
/// reported as `None`.
pub fn resolve_value(root: &dyn Resolvable, path: &str) -> Option<PropertyValue> {
    let path = GroupPath::parse(path).ok()?;
    match resolve(root, &path).ok()? {
        Resolution::Resolved { value, .. } if !value.is_null() => Some(value),
        _ => None,
    }
}

/// Typed lenient lookup: like [`resolve_value`], converted to `T`.
///
/// Returns `None` when the value is absent or of another kind.
pub fn resolve_as<T: FromPropertyValue>(root: &dyn Resolvable, path: &str) -> Option<T> {
    resolve_value(root, path).and_then(T::from_property_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::{Property, Signal};
    use tandem_macros::Resolvable;

    #[derive(Resolvable)]
    #[resolvable(notify = "changed")]
    struct City {
        #[property(name = "Name")]
        name: Property<String>,
        changed: Signal<&'static str>,
    }

    // Exposes no change signal, so it never appears in a chain.
    #[derive(Resolvable)]
    struct Address {
        #[property(name = "City")]
        city: Option<Arc<City>>,
        #[property(name = "Zip")]
        zip: u32,
    }

    #[derive(Resolvable)]
    #[resolvable(notify = "changed")]
    struct Person {
        #[property(name = "Address")]
        address: Property<Option<Arc<Address>>>,
        changed: Signal<&'static str>,
    }

    fn person(city: Option<&str>) -> Person {
        let city = city.map(|name| {
            Arc::new(City {
                name: Property::new(name.to_string()),
                changed: Signal::new(),
            })
        });
        Person {
            address: Property::new(Some(Arc::new(Address { city, zip: 1000 }))),
            changed: Signal::new(),
        }
    }

    fn path(text: &str) -> GroupPath {
        GroupPath::parse(text).unwrap()
    }

    #[test]
    fn test_parse() {
        let parsed = path("Address.City.Name");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.first(), "Address");
        assert_eq!(parsed.terminal(), "Name");
        assert_eq!(parsed.to_string(), "Address.City.Name");
        assert_eq!("Zip".parse::<GroupPath>().unwrap().terminal(), "Zip");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        for bad in ["", ".", "A..B", ".A", "A."] {
            assert_eq!(
                GroupPath::parse(bad),
                Err(PathError::InvalidPath { path: bad.to_string() }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_nested_value_and_chain() {
        let root = person(Some("Oslo"));
        let resolution = resolve(&root, &path("Address.City.Name")).unwrap();

        assert_eq!(resolution.value(), Some(&PropertyValue::String("Oslo".into())));
        // Address has no change signal; City does. The root is excluded.
        let chain: Vec<_> = resolution.chain().iter().map(|link| link.type_name()).collect();
        assert_eq!(chain, vec!["City"]);
    }

    #[test]
    fn test_null_intermediate_is_unresolved() {
        let root = person(None);
        let resolution = resolve(&root, &path("Address.City.Name")).unwrap();
        assert!(!resolution.is_resolved());
        assert!(resolution.chain().is_empty());
    }

    #[test]
    fn test_null_terminal_is_resolved() {
        let root = person(None);
        let resolution = resolve(&root, &path("Address.City")).unwrap();
        assert_eq!(resolution.value(), Some(&PropertyValue::Null));
    }

    #[test]
    fn test_missing_member() {
        let root = person(Some("Oslo"));
        assert_eq!(
            resolve(&root, &path("Address.Street")).unwrap_err(),
            PathError::MissingMember {
                type_name: "Address",
                member: "Street".into()
            }
        );
        assert_eq!(
            resolve(&root, &path("Adress")).unwrap_err(),
            PathError::MissingMember {
                type_name: "Person",
                member: "Adress".into()
            }
        );
    }

    #[test]
    fn test_scalar_cannot_be_walked() {
        let root = person(Some("Oslo"));
        assert_eq!(
            resolve(&root, &path("Address.Zip.Digits")).unwrap_err(),
            PathError::MissingMember {
                type_name: "int",
                member: "Digits".into()
            }
        );
    }

    #[test]
    fn test_lenient_lookup() {
        let root = person(Some("Oslo"));
        assert_eq!(resolve_as::<String>(&root, "Address.City.Name"), Some("Oslo".into()));
        assert_eq!(resolve_as::<i64>(&root, "Address.Zip"), Some(1000));
        assert_eq!(resolve_as::<bool>(&root, "Address.Zip"), None);
        assert_eq!(resolve_value(&root, "Address.Nope"), None);
        assert_eq!(resolve_value(&root, "Address..Zip"), None);

        let homeless = person(None);
        assert_eq!(resolve_value(&homeless, "Address.City.Name"), None);
        assert_eq!(resolve_value(&homeless, "Address.City"), None);
    }
}
