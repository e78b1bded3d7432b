//! Relay server configuration

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{RelaisError, Result};

/// Configuration for a relay server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Address the listener binds to
    pub listen_addr: SocketAddr,
    /// Fixed origin address every session dials
    pub origin_addr: SocketAddr,
    /// Capacity of each backpressure window in bytes
    pub window_capacity: usize,
    /// Maximum number of retired sessions the pool retains
    pub max_pool: usize,
    /// Capacity of one readiness event batch
    pub events_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 1110)),
            origin_addr: SocketAddr::from(([127, 0, 0, 1], 110)),
            window_capacity: crate::defaults::DEFAULT_WINDOW_CAPACITY,
            max_pool: crate::defaults::DEFAULT_MAX_POOL,
            events_capacity: crate::defaults::DEFAULT_EVENTS_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Create a configuration for the given listen and origin addresses
    pub fn new(listen_addr: SocketAddr, origin_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            origin_addr,
            ..Default::default()
        }
    }

    /// Set the backpressure window capacity
    pub fn with_window_capacity(mut self, capacity: usize) -> Self {
        self.window_capacity = capacity;
        self
    }

    /// Set the session pool bound
    pub fn with_max_pool(mut self, max_pool: usize) -> Self {
        self.max_pool = max_pool;
        self
    }

    /// Set the readiness event batch capacity
    pub fn with_events_capacity(mut self, capacity: usize) -> Self {
        self.events_capacity = capacity;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.window_capacity == 0 {
            return Err(RelaisError::invalid_parameter(
                "window_capacity",
                "Window capacity must be greater than 0",
            ));
        }
        if self.events_capacity == 0 {
            return Err(RelaisError::invalid_parameter(
                "events_capacity",
                "Event batch capacity must be greater than 0",
            ));
        }
        if self.listen_addr == self.origin_addr {
            return Err(RelaisError::invalid_parameter(
                "origin_addr",
                "Origin address must differ from the listen address",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RelayConfig;

    #[test]
    fn test_default_config_validates() {
        assert!(RelayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = RelayConfig::default()
            .with_window_capacity(4096)
            .with_max_pool(10)
            .with_events_capacity(64);

        assert_eq!(config.window_capacity, 4096);
        assert_eq!(config.max_pool, 10);
        assert_eq!(config.events_capacity, 64);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RelayConfig::default().with_window_capacity(0);
        assert!(config.validate().is_err());

        let addr = "127.0.0.1:9000".parse().unwrap();
        let config = RelayConfig::new(addr, addr);
        assert!(config.validate().is_err());
    }
}
