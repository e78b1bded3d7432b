//! Relay and pool statistics tracking

/// Counters for relay monitoring
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    /// Sessions successfully accepted and paired with an origin dial
    pub sessions_accepted: u64,
    /// Sessions that reached clean completion
    pub sessions_closed: u64,
    /// Sessions torn down after an internal failure
    pub sessions_failed: u64,
    /// Accept attempts that failed outright
    pub accept_failures: u64,
    /// Origin dials that failed
    pub dial_failures: u64,
    /// Total bytes relayed from clients to the origin
    pub bytes_client_to_origin: u64,
    /// Total bytes relayed from the origin to clients
    pub bytes_origin_to_client: u64,
}

impl RelayStats {
    /// Create new statistics instance
    pub fn new() -> Self {
        Default::default()
    }

    /// Total bytes relayed in both directions
    pub fn total_bytes(&self) -> u64 {
        self.bytes_client_to_origin + self.bytes_origin_to_client
    }

    /// Fraction of finished sessions that ended in failure (0.0 to 1.0)
    pub fn failure_rate(&self) -> f64 {
        let finished = self.sessions_closed + self.sessions_failed;
        if finished == 0 {
            return 0.0;
        }
        self.sessions_failed as f64 / finished as f64
    }
}

/// Counters for session pool reuse
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Allocations served from the free list
    pub recycled: u64,
    /// Allocations that built a fresh session
    pub fresh: u64,
    /// Releases dropped because the free list was at capacity
    pub discarded: u64,
}

impl PoolStats {
    /// Create new statistics instance
    pub fn new() -> Self {
        Default::default()
    }

    /// Fraction of allocations served from the free list (0.0 to 1.0)
    pub fn reuse_rate(&self) -> f64 {
        let total = self.recycled + self.fresh;
        if total == 0 {
            return 0.0;
        }
        self.recycled as f64 / total as f64
    }
}
