//! # Components Module
//!
//! Plain data attached to entities. None of these types carry behavior beyond
//! small helpers; the systems in [`crate::systems`] act on them.

pub mod ai;
pub mod presentation;
pub mod spatial;
pub mod tags;
pub mod vitals;

pub use ai::*;
pub use presentation::*;
pub use spatial::*;
pub use tags::*;
pub use vitals::*;
