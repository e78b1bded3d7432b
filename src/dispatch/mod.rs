//! Thin seam to the readiness-event multiplexor
//!
//! The multiplexor itself is external (mio). This module owns the pieces the
//! relay core needs around it: the duplex interest mask, copied-out event
//! snapshots, and a `Dispatcher` wrapping the poll instance with token
//! allocation.

pub mod dispatcher;
pub mod interest;

// Re-export main types for convenience
pub use dispatcher::{DispatchEvent, Dispatcher, EventSnapshot};
pub use interest::Duplex;
