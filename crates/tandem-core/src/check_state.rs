//! Tri-state check flag.

use serde::{Deserialize, Serialize};

/// The state of a tri-state flag.
///
/// Used as the aggregate of a group of boolean selection flags:
/// - `Unchecked`: every flag is off
/// - `Checked`: every flag is on
/// - `PartiallyChecked`: the flags are mixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CheckState {
    /// The flag is off.
    #[default]
    Unchecked,
    /// The flag is on.
    Checked,
    /// The flag is indeterminate.
    PartiallyChecked,
}

impl CheckState {
    /// Returns `true` if the state is `Checked`.
    pub fn is_checked(&self) -> bool {
        matches!(self, CheckState::Checked)
    }

    /// Returns `true` if the state is `Unchecked`.
    pub fn is_unchecked(&self) -> bool {
        matches!(self, CheckState::Unchecked)
    }

    /// Returns `true` if the state is `PartiallyChecked`.
    pub fn is_partially_checked(&self) -> bool {
        matches!(self, CheckState::PartiallyChecked)
    }

    /// The state a user click moves to.
    ///
    /// `Unchecked` becomes `Checked`; `Checked` and `PartiallyChecked` become
    /// `Unchecked`.
    pub fn toggled(&self) -> CheckState {
        match self {
            CheckState::Unchecked => CheckState::Checked,
            CheckState::Checked | CheckState::PartiallyChecked => CheckState::Unchecked,
        }
    }

    /// The definite boolean value, or `None` for `PartiallyChecked`.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            CheckState::Checked => Some(true),
            CheckState::Unchecked => Some(false),
            CheckState::PartiallyChecked => None,
        }
    }

    /// Aggregate a sequence of boolean flags.
    ///
    /// Returns `None` for an empty sequence; the caller decides what an empty
    /// group means.
    pub fn aggregate<I>(flags: I) -> Option<CheckState>
    where
        I: IntoIterator<Item = bool>,
    {
        let mut any_on = false;
        let mut any_off = false;
        for flag in flags {
            if flag {
                any_on = true;
            } else {
                any_off = true;
            }
            if any_on && any_off {
                return Some(CheckState::PartiallyChecked);
            }
        }
        match (any_on, any_off) {
            (true, false) => Some(CheckState::Checked),
            (false, true) => Some(CheckState::Unchecked),
            _ => None,
        }
    }
}

impl From<bool> for CheckState {
    fn from(checked: bool) -> Self {
        if checked {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggled() {
        assert_eq!(CheckState::Unchecked.toggled(), CheckState::Checked);
        assert_eq!(CheckState::Checked.toggled(), CheckState::Unchecked);
        assert_eq!(CheckState::PartiallyChecked.toggled(), CheckState::Unchecked);
    }

    #[test]
    fn test_aggregate() {
        assert_eq!(CheckState::aggregate([]), None);
        assert_eq!(CheckState::aggregate([true]), Some(CheckState::Checked));
        assert_eq!(CheckState::aggregate([false]), Some(CheckState::Unchecked));
        assert_eq!(CheckState::aggregate([true, true]), Some(CheckState::Checked));
        assert_eq!(
            CheckState::aggregate([false, true, false]),
            Some(CheckState::PartiallyChecked)
        );
    }

    #[test]
    fn test_bool_conversions() {
        assert_eq!(CheckState::from(true), CheckState::Checked);
        assert_eq!(CheckState::from(false), CheckState::Unchecked);
        assert_eq!(CheckState::PartiallyChecked.to_bool(), None);
        assert!(CheckState::default().is_unchecked());
    }
}
