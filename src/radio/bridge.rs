//! Serial Bridge
//!
//! Accumulates host bytes into the pending outgoing packet. Small writes
//! are amortized into full packets; the inter-byte idle timeout bounds the
//! latency of short messages.

use crate::types::Packet;

/// Outgoing packet under construction from the host byte stream
#[derive(Debug, Default)]
pub struct TxAccumulator {
    pkt: Packet,
}

impl TxAccumulator {
    /// Create an empty accumulator
    #[must_use]
    pub const fn new() -> Self {
        Self { pkt: Packet::new() }
    }

    /// Append one host byte; `false` when the packet is already full, in
    /// which case the byte must stay queued upstream
    pub fn push(&mut self, byte: u8) -> bool {
        self.pkt.push(byte)
    }

    /// Bytes accumulated so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.pkt.len()
    }

    /// Nothing queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pkt.is_empty()
    }

    /// Packet is at the maximum payload length
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.pkt.is_full()
    }

    /// Flush condition: a full packet goes out immediately, a partial one
    /// only once the host has stayed quiet past the idle timeout
    #[must_use]
    pub fn should_flush(&self, idle_expired: bool) -> bool {
        self.pkt.is_full() || (!self.pkt.is_empty() && idle_expired)
    }

    /// The packet being accumulated
    #[must_use]
    pub fn packet(&self) -> &Packet {
        &self.pkt
    }

    /// Drop the accumulated bytes after a successful FIFO injection
    pub fn clear(&mut self) {
        self.pkt.clear();
    }
}
