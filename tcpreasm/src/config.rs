//! Runtime configuration of the reassembly engine.
//!
//! Capacities are const generic parameters of
//! [`ReassemblyEngine`](crate::engine::ReassemblyEngine); only behaviour
//! switches live here.

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Buffer segments that arrive ahead of `recv_nxt`.
    ///
    /// When disabled only in-order data is accepted and everything else is
    /// left to the peer's retransmission.
    pub out_of_order: bool,
}

impl ReassemblyConfig {
    /// Creates the default configuration.
    pub const fn new() -> Self {
        Self { out_of_order: true }
    }

    /// Sets whether out-of-order segments are buffered.
    pub const fn with_out_of_order(mut self, enabled: bool) -> Self {
        self.out_of_order = enabled;
        self
    }
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self::new()
    }
}
