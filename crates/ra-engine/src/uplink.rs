//! The terminal-side queries the scheduler depends on.

/// Read-only view of the terminal's queue and capacity situation.
///
/// Implemented by whatever owns the transmit buffers and tracks DAMA grants.
/// The scheduler calls these synchronously during an evaluation and expects
/// no side effects.
pub trait UplinkState {
    /// `true` if a dedicated capacity grant already covers this terminal.
    /// No contention opportunity is issued while this holds.
    fn is_dama_available(&self) -> bool;

    /// `true` if there is no queued data at all.
    fn are_buffers_empty(&self) -> bool;

    /// How many queued packets are at most `max_bytes` long.
    fn num_candidate_packets(&self, max_bytes: u32) -> u32;
}

/// An [`UplinkState`] backed by plain data.
///
/// Useful in tests and drivers that model the queue as a list of packet
/// sizes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedUplink {
    pub dama_available: bool,
    /// Sizes in bytes of the queued packets.
    pub packet_sizes:   Vec<u32>,
}

impl FixedUplink {
    /// Empty queue, no DAMA grant.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_packets(packet_sizes: Vec<u32>) -> Self {
        Self { dama_available: false, packet_sizes }
    }

    /// Mark a DAMA grant as present.
    pub fn with_dama(mut self) -> Self {
        self.dama_available = true;
        self
    }
}

impl UplinkState for FixedUplink {
    #[inline]
    fn is_dama_available(&self) -> bool {
        self.dama_available
    }

    #[inline]
    fn are_buffers_empty(&self) -> bool {
        self.packet_sizes.is_empty()
    }

    fn num_candidate_packets(&self, max_bytes: u32) -> u32 {
        let n = self.packet_sizes.iter().filter(|&&size| size <= max_bytes).count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }
}
