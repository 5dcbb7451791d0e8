//! Calls: merged evidence of a gene in a condition
//!
//! - [`Evidence`]: a single record from the evidence store
//! - [`BasicCall`]: all evidence directly observed in one condition
//! - [`GlobalCall`]: a `BasicCall` plus evidence inherited through the ontology
//!
//! The [`Direction`] of a `GlobalCall` is part of its type. [`Presence`]
//! inherits expression evidence from descendant conditions, [`Absence`]
//! inherits absence evidence from ancestor conditions.

mod basic;
mod evidence;
mod global;
mod origin;

pub use basic::BasicCall;
pub use evidence::{DataStates, DataTypeCall, Evidence};
pub use global::{AbsenceCall, GlobalCall, PresenceCall};
pub use origin::{
    Absence, AbsenceOrigin, Closure, Direction, OriginOfLine, Presence, PresenceOrigin,
};
