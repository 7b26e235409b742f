//! Tri-state controls.
//!
//! The aggregator drives a single [`TriStateControl`]: it writes the aggregate
//! into the control and listens to the control's `state_changed` signal to fan
//! a user toggle out to every tracked item.

use tandem_core::{CheckState, Property, Signal};

/// A control showing a tri-state flag that the user can also toggle.
pub trait TriStateControl: Send + Sync {
    /// The current state.
    fn check_state(&self) -> CheckState;

    /// Set the state. Implementations emit `state_changed` only on change.
    fn set_check_state(&self, state: CheckState);

    /// Emitted with the new state whenever it changes.
    fn state_changed(&self) -> &Signal<CheckState>;
}

/// An in-process tri-state check box.
///
/// # Signals
///
/// - `state_changed(CheckState)`: Emitted when the check state changes
/// - `toggled(bool)`: Emitted when the state moves into or out of `Checked`
///
/// # Example
///
/// ```
/// use tandem::selection::{TriStateCheckBox, TriStateControl};
/// use tandem_core::CheckState;
///
/// let check_box = TriStateCheckBox::new();
/// check_box.set_check_state(CheckState::PartiallyChecked);
///
/// // A click on a partial box clears it.
/// check_box.click();
/// assert_eq!(check_box.check_state(), CheckState::Unchecked);
/// ```
pub struct TriStateCheckBox {
    state: Property<CheckState>,

    /// Signal emitted when the check state changes.
    pub state_changed: Signal<CheckState>,

    /// Signal emitted when the checked flag changes.
    pub toggled: Signal<bool>,
}

impl Default for TriStateCheckBox {
    fn default() -> Self {
        Self::new()
    }
}

impl TriStateCheckBox {
    /// Create an unchecked box.
    pub fn new() -> Self {
        Self {
            state: Property::new(CheckState::Unchecked),
            state_changed: Signal::new(),
            toggled: Signal::new(),
        }
    }

    /// Set the initial state using builder pattern. No signal is emitted.
    pub fn with_check_state(self, state: CheckState) -> Self {
        self.state.set_silent(state);
        self
    }

    /// Returns `true` if the box is fully checked.
    pub fn is_checked(&self) -> bool {
        self.state.get().is_checked()
    }

    /// Set the box to `Checked` or `Unchecked`.
    pub fn set_checked(&self, checked: bool) {
        self.apply(CheckState::from(checked));
    }

    /// Advance the state as a user click would.
    ///
    /// `Unchecked` becomes `Checked`; `Checked` and `PartiallyChecked` become
    /// `Unchecked`. The partial state is only ever set programmatically.
    pub fn toggle(&self) {
        self.apply(self.state.get().toggled());
    }

    /// Simulate a user click. Same as [`toggle`](Self::toggle).
    pub fn click(&self) {
        self.toggle();
    }

    fn apply(&self, state: CheckState) {
        let Some(previous) = self.state.replace(state) else {
            return;
        };
        if previous.is_checked() != state.is_checked() {
            self.toggled.emit(state.is_checked());
        }
        self.state_changed.emit(state);
    }
}

impl TriStateControl for TriStateCheckBox {
    fn check_state(&self) -> CheckState {
        self.state.get()
    }

    fn set_check_state(&self, state: CheckState) {
        self.apply(state);
    }

    fn state_changed(&self) -> &Signal<CheckState> {
        &self.state_changed
    }
}

impl std::fmt::Debug for TriStateCheckBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriStateCheckBox")
            .field("state", &self.state.get())
            .finish()
    }
}

static_assertions::assert_impl_all!(TriStateCheckBox: Send, Sync);
