//! Deferred value slots for settle.
//!
//! A [`DeferredSlot`] separates creating a result slot from producing its value.
//! Producers settle it once with [`DeferredSlot::fulfill`] or
//! [`DeferredSlot::reject`]; consumers await [`DeferredSlot::accessor`] before or
//! after that happens and all see the same outcome.

mod slot;

pub use slot::{Accessor, AlreadySettled, DeferredSlot, SlotError, SlotState};
