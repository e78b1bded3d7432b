//! Fixed-capacity byte windows used as backpressure buffers
//!
//! One window backs each relay direction: the reading side fills it from its
//! socket, the writing side drains it to the opposite socket. A full window
//! withholds READ interest, an empty window withholds WRITE interest.

pub mod window;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use window::ByteWindow;
