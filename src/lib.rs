//! # Relais - Readiness-Driven TCP Relay Core
//!
//! Relais is the session core of a TCP reverse proxy: it accepts client
//! connections, dials a paired connection to a fixed origin, and shuttles
//! bytes in both directions until either side closes, on a non-blocking,
//! single-threaded, readiness-driven event loop.
//!
//! ## Features
//!
//! - **Duplex-copy engine**: two cross-wired channels per session, interest
//!   recomputed after every byte moved
//! - **Backpressure windows**: fixed-capacity buffers throttle reading when
//!   full and writing when empty
//! - **Half-close propagation**: each direction closes independently;
//!   buffered bytes drain before the far write side shuts
//! - **Session pooling**: a bounded free list amortizes allocation under
//!   connection churn
//! - **Per-connection failure handling**: a failed dial, registration or
//!   transfer ends one session, never the server
//! - **Byte-transparent**: no framing, no protocol inspection
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐   readable    ┌──────────────────────────────┐
//! │ client │ ────────────▶ │ client channel ──▶ window A  │
//! │ socket │ ◀──────────── │ window B ──▶ (drain)         │
//! └────────┘   writable    ├──────────────────────────────┤
//!                          │ origin channel ──▶ window B  │
//! ┌────────┐   readable    │ window A ──▶ (drain)         │
//! │ origin │ ────────────▶ └──────────────────────────────┘
//! │ socket │ ◀────────────        one Session, pooled
//! └────────┘   writable
//! ```

// Core modules
pub mod config;
pub mod dispatch;
pub mod error;
pub mod proxy;
pub mod session;
pub mod window;

// Main API re-exports
pub use config::RelayConfig;
pub use dispatch::{DispatchEvent, Dispatcher, Duplex, EventSnapshot};
pub use error::{RelaisError, Result};
pub use proxy::{Acceptor, RelayServer, LISTENER};
pub use session::{Channel, PoolStats, RelayStats, Session, SessionPool, SessionState, Side};
pub use window::ByteWindow;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration constants
pub mod defaults {
    /// Default capacity of each backpressure window in bytes
    pub const DEFAULT_WINDOW_CAPACITY: usize = 2048;

    /// Default bound on the session free list
    pub const DEFAULT_MAX_POOL: usize = 50;

    /// Default capacity of one readiness event batch
    pub const DEFAULT_EVENTS_CAPACITY: usize = 1024;
}
