//! Fixed-capacity pool of retired sessions
//!
//! Connection churn would otherwise allocate two windows per accept. Retired
//! sessions keep their window allocations and are reset on the way back out;
//! the free list never grows past its configured bound, releases beyond it
//! simply drop the object.

use std::cell::RefCell;
use std::rc::Rc;

use mio::net::TcpStream;
use mio::Token;

use crate::error::Result;

use super::session::Session;
use super::stats::PoolStats;

/// Free list of reusable `Session` objects.
///
/// Correctness depends on a single-threaded caller: the event loop thread
/// owns the pool, so there is no internal locking. A released session must
/// already be torn down (terminal state, sockets dropped); `alloc` resets
/// every field before handing it back out.
#[derive(Debug)]
pub struct SessionPool {
    /// Retired sessions available for reuse
    free: Vec<Rc<RefCell<Session>>>,
    /// Bound on the free list
    max_pool: usize,
    /// Window capacity used for fresh sessions
    window_capacity: usize,
    /// Reuse counters
    stats: PoolStats,
}

impl SessionPool {
    /// Create a pool retaining up to `max_pool` sessions with windows of
    /// `window_capacity` bytes
    pub fn new(max_pool: usize, window_capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(max_pool),
            max_pool,
            window_capacity,
            stats: PoolStats::default(),
        }
    }

    /// Take a session for a fresh connection pair, reusing a retired object
    /// when one is available
    pub fn alloc(
        &mut self,
        client: TcpStream,
        origin: TcpStream,
        client_token: Token,
        origin_token: Token,
    ) -> Result<Rc<RefCell<Session>>> {
        if let Some(session) = self.free.pop() {
            session
                .borrow_mut()
                .rebind(client, origin, client_token, origin_token);
            self.stats.recycled += 1;
            return Ok(session);
        }

        let session = Session::new(
            client,
            origin,
            client_token,
            origin_token,
            self.window_capacity,
        )?;
        self.stats.fresh += 1;
        Ok(Rc::new(RefCell::new(session)))
    }

    /// Return a retired session.
    ///
    /// Retained while the free list is below capacity; dropped otherwise —
    /// an over-capacity release is not an error.
    pub fn release(&mut self, session: Rc<RefCell<Session>>) {
        if self.free.len() < self.max_pool {
            self.free.push(session);
        } else {
            self.stats.discarded += 1;
        }
    }

    /// Get the number of sessions currently retained
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Check whether the free list is empty
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Get the free-list bound
    pub fn capacity(&self) -> usize {
        self.max_pool
    }

    /// Get the reuse counters
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}
