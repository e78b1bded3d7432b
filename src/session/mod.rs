//! Session state, duplex-copy engine and session pooling
//!
//! A session owns one client socket, one origin socket, two backpressure
//! windows and two channels wired crosswise over them. The copy engine moves
//! bytes on readiness events, recomputes interest after every transfer, and
//! propagates half-closes until both channels' masks empty, at which point
//! the session tears down exactly once and returns to the pool.

pub mod channel;
pub mod pool;
pub mod session;
pub mod stats;


// Re-export main types for convenience
pub use channel::{Channel, Side};
pub use pool::SessionPool;
pub use session::{Session, SessionState};
pub use stats::{PoolStats, RelayStats};
