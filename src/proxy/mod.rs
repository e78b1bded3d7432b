//! Accept path and event-loop glue around the session core

pub mod acceptor;
pub mod server;

// Re-export main types for convenience
pub use acceptor::Acceptor;
pub use server::{RelayServer, LISTENER};
