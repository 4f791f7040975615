#![forbid(unsafe_code)]

//! Handle-based embedding boundary for [`vtgrid_core`].
//!
//! Hosts that cannot hold a `Terminal` by value (FFI layers, scripting
//! bridges, plugin systems) go through a [`TerminalRegistry`]: instances are
//! owned by the registry and addressed by opaque [`TerminalHandle`] values.
//! Every operation on a freed or forged handle is a checked, defined
//! failure, never undefined behavior:
//!
//! - mutating calls report `InvalidHandle` through their status enum,
//! - queries return an empty/invalid result ([`CursorReport::valid`] is
//!   false, `dump_viewport` is empty),
//! - [`TerminalRegistry::free`] is idempotent.
//!
//! Slots are generational: freeing a slot bumps its generation, so a stale
//! handle can never alias a terminal created later in the same slot.

pub mod registry;

pub use registry::{
    CreateError, CursorReport, FeedStatus, MAX_DIMENSION, ResizeStatus, ScrollStatus,
    TerminalHandle, TerminalRegistry,
};
