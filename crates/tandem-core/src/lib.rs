//! Core reactive primitives for tandem.
//!
//! This crate provides the building blocks the `tandem` crate composes into a
//! collection mirror and a group selection aggregator:
//!
//! - **Signal/Slot System**: Type-safe observer lists with re-entrant emission
//! - **Property System**: Change-detecting value cells
//! - **Dynamic Values**: [`PropertyValue`] and the [`Resolvable`] lookup trait
//! - **Observable Collections**: [`ObservableVec`] with bulk adds
//! - **Tri-state Flags**: [`CheckState`]
//!
//! # Signal/Slot Example
//!
//! ```
//! use tandem_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Notifying Object Example
//!
//! ```
//! use tandem_core::{Notify, Property, Selectable, Signal};
//!
//! struct Row {
//!     selected: Property<bool>,
//!     changed: Signal<&'static str>,
//! }
//!
//! impl Notify for Row {
//!     fn property_changed(&self) -> &Signal<&'static str> {
//!         &self.changed
//!     }
//! }
//!
//! impl Selectable for Row {
//!     fn is_selected(&self) -> bool {
//!         self.selected.get()
//!     }
//!
//!     fn set_selected(&self, selected: bool) {
//!         if self.selected.set(selected) {
//!             self.changed.emit("selected");
//!         }
//!     }
//! }
//! ```

mod check_state;
pub mod collection;
mod error;
pub mod logging;
mod notify;
pub mod property;
pub mod signal;
pub mod value;

pub use check_state::CheckState;
pub use collection::{CollectionChange, MutableSequence, ObservableVec, Sequence};
pub use error::{CollectionError, PathError, Result, TandemError};
pub use logging::PerfSpan;
pub use notify::{Notify, Resolvable, Selectable};
pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use value::{FromPropertyValue, IntoPropertyValue, PropertyValue};
