//! Load-link / store-conditional reservations.
//!
//! A load-link records a reservation for its address. The paired
//! store-conditional succeeds only while that reservation is intact and was
//! made by the same operation; any external write to the address drops the
//! reservation, failing every later store-conditional until a fresh
//! load-link.

use std::collections::HashMap;

use crate::common::SeqNum;

/// Per-address reservation table.
#[derive(Clone, Debug, Default)]
pub struct ReservationTable {
    reservations: HashMap<u64, SeqNum>,
}

impl ReservationTable {
    /// Creates an empty reservation table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a load-link reservation for `addr`, replacing any previous
    /// reservation on the address.
    pub fn load_link(&mut self, addr: u64, seq: SeqNum) {
        let _ = self.reservations.insert(addr, seq);
    }

    /// Attempts a store-conditional. Succeeds iff the address holds a
    /// reservation made by `seq`; the reservation is consumed on success.
    pub fn store_conditional(&mut self, addr: u64, seq: SeqNum) -> bool {
        match self.reservations.get(&addr) {
            Some(&owner) if owner == seq => {
                let _ = self.reservations.remove(&addr);
                true
            }
            _ => false,
        }
    }

    /// Drops the reservation on `addr`, if any. Called when something else
    /// writes the address.
    pub fn invalidate(&mut self, addr: u64) {
        let _ = self.reservations.remove(&addr);
    }

    /// Number of live reservations.
    pub fn active(&self) -> usize {
        self.reservations.len()
    }
}
