//! Duplex interest mask for one channel's descriptor

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use mio::Interest;

/// Subset of {READ, WRITE} a channel wants from the dispatcher.
///
/// Mirrors the dispatcher's interest bits but, unlike `mio::Interest`, can be
/// empty. An empty desired mask means the descriptor should be deregistered
/// until recomputation yields a non-empty mask again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Duplex(u8);

impl Duplex {
    /// No interest in either direction
    pub const NONE: Duplex = Duplex(0);
    /// Interest in readability
    pub const READ: Duplex = Duplex(0b01);
    /// Interest in writability
    pub const WRITE: Duplex = Duplex(0b10);
    /// Interest in both directions
    pub const BOTH: Duplex = Duplex(0b11);

    /// Check whether all bits of `other` are set
    pub fn contains(self, other: Duplex) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`
    pub fn insert(&mut self, other: Duplex) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`
    pub fn remove(&mut self, other: Duplex) {
        self.0 &= !other.0;
    }

    /// Check whether no bit is set
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Map to the multiplexor's interest type; `None` for the empty mask
    pub fn to_interest(self) -> Option<Interest> {
        match (self.contains(Self::READ), self.contains(Self::WRITE)) {
            (true, true) => Some(Interest::READABLE | Interest::WRITABLE),
            (true, false) => Some(Interest::READABLE),
            (false, true) => Some(Interest::WRITABLE),
            (false, false) => None,
        }
    }
}

impl BitOr for Duplex {
    type Output = Duplex;

    fn bitor(self, rhs: Duplex) -> Duplex {
        Duplex(self.0 | rhs.0)
    }
}

impl BitOrAssign for Duplex {
    fn bitor_assign(&mut self, rhs: Duplex) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Duplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.contains(Self::READ), self.contains(Self::WRITE)) {
            (true, true) => write!(f, "read|write"),
            (true, false) => write!(f, "read"),
            (false, true) => write!(f, "write"),
            (false, false) => write!(f, "none"),
        }
    }
}
