//! Selection aggregator configuration.

use serde::{Deserialize, Serialize};
use tandem_core::{CheckState, IntoPropertyValue, PathError, PropertyValue};

use super::path::GroupPath;

/// The aggregate reported when no item is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmptyGroupPolicy {
    /// An empty group reads as unchecked.
    #[default]
    Unchecked,
    /// An empty group reads as checked.
    Checked,
}

impl EmptyGroupPolicy {
    /// The aggregate this policy assigns to an empty group.
    pub fn state(self) -> CheckState {
        match self {
            EmptyGroupPolicy::Unchecked => CheckState::Unchecked,
            EmptyGroupPolicy::Checked => CheckState::Checked,
        }
    }
}

/// Configuration for a [`SelectionAggregator`](super::SelectionAggregator).
///
/// Without a group path every source item is tracked. With one, an item is
/// tracked when the value at the path equals the group key; a missing key
/// matches null values.
///
/// # Example
///
/// ```
/// use tandem::selection::{EmptyGroupPolicy, SelectorConfig};
///
/// let config = SelectorConfig::new()
///     .with_group_path("Address.Region.Name")
///     .with_group_key("north")
///     .with_empty_policy(EmptyGroupPolicy::Checked);
///
/// let loaded: SelectorConfig = serde_json::from_str(
///     r#"{"group_path": "Address.Region.Name", "group_key": "north", "empty_policy": "Checked"}"#,
/// ).unwrap();
/// assert_eq!(config, loaded);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Dotted path to the grouping property, or `None` to track everything.
    pub group_path: Option<String>,
    /// The value items must hold at `group_path` to be tracked.
    pub group_key: Option<PropertyValue>,
    /// The aggregate reported for an empty group.
    pub empty_policy: EmptyGroupPolicy,
}

impl SelectorConfig {
    /// Create a configuration that tracks every item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grouping path.
    pub fn with_group_path(mut self, path: impl Into<String>) -> Self {
        self.group_path = Some(path.into());
        self
    }

    /// Set the group key.
    pub fn with_group_key(mut self, key: impl IntoPropertyValue) -> Self {
        self.group_key = Some(key.into_property_value());
        self
    }

    /// Set the empty-group policy.
    pub fn with_empty_policy(mut self, policy: EmptyGroupPolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    /// The key tracked items must match. A missing key is `Null`.
    pub fn key(&self) -> PropertyValue {
        self.group_key.clone().unwrap_or_default()
    }

    /// Parse the grouping path, if one is set.
    pub fn parsed_path(&self) -> Result<Option<GroupPath>, PathError> {
        self.group_path.as_deref().map(GroupPath::parse).transpose()
    }
}
