//! Receive-side stream statistics.
//!
//! Counters for overflow, empty reads and reordering, plus the RFC 3550
//! §6.4.1 / Appendix A.8 interarrival jitter estimate, updated once per
//! packet arrival. Jitter is kept in RTP timestamp ticks.

use std::time::Instant;

use crate::RtpTimestamp;

/// Point-in-time statistics snapshot.
///
/// `jitter` and `max_jitter` are truncations of the floating estimate,
/// in RTP timestamp ticks. No cross-field consistency is guaranteed
/// between two snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JitterStats {
    /// Packets that arrived out of sequence order
    pub out_of_order: u32,

    /// Pops that found the queue empty
    pub empty_reads: u32,

    /// Head evictions forced by the depth ceiling
    pub overflows: u32,

    /// Current interarrival jitter estimate, in timestamp ticks
    pub jitter: u32,

    /// Highest jitter estimate seen since the last reset
    pub max_jitter: u32,
}

/// Running statistics state, owned by the buffer and updated under its lock.
#[derive(Debug, Clone)]
pub(crate) struct StreamStats {
    pub out_of_order: u32,
    pub empty_reads: u32,
    pub overflows: u32,

    jitter: f64,
    max_jitter: f64,

    /// Synthesized arrival clock of the previous packet, in ticks
    prev_arrival: u32,

    /// Transit offset of the previous packet, in ticks
    prev_transit: i32,

    /// Wall-clock arrival of the previous packet
    prev_rx: Option<Instant>,

    /// Timestamp ticks per millisecond of wall clock
    ts_units_per_ms: u32,
}

impl StreamStats {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            out_of_order: 0,
            empty_reads: 0,
            overflows: 0,
            jitter: 0.0,
            max_jitter: 0.0,
            prev_arrival: 0,
            prev_transit: 0,
            prev_rx: None,
            ts_units_per_ms: sample_rate_hz / 1000,
        }
    }

    /// Fold one packet arrival into the jitter estimate.
    ///
    /// J(i) = J(i-1) + (|D(i-1,i)| - J(i-1)) / 16, where D is the
    /// difference in transit times between consecutive packets. The
    /// synthesized arrival clock is re-anchored to the packet's own
    /// timestamp after each update rather than to the synthesized value.
    /// TODO: anchoring to the synthesized arrival would match A.8 exactly.
    pub fn record_arrival(&mut self, timestamp: RtpTimestamp, now: Instant) {
        let interarrival_ms = match self.prev_rx {
            Some(prev) => now.duration_since(prev).as_millis() as u32,
            None => 0,
        };

        let arrival = if self.prev_arrival == 0 {
            timestamp
        } else {
            self.prev_arrival
                .wrapping_add(interarrival_ms.wrapping_mul(self.ts_units_per_ms))
        };

        let transit = arrival.wrapping_sub(timestamp) as i32;
        let d = (i64::from(transit) - i64::from(self.prev_transit)).unsigned_abs() as f64;

        self.jitter += (d - self.jitter) / 16.0;
        if self.jitter > self.max_jitter {
            self.max_jitter = self.jitter;
        }

        self.prev_transit = transit;
        self.prev_arrival = timestamp;
        self.prev_rx = Some(now);
    }

    pub fn snapshot(&self) -> JitterStats {
        JitterStats {
            out_of_order: self.out_of_order,
            empty_reads: self.empty_reads,
            overflows: self.overflows,
            jitter: self.jitter as u32,
            max_jitter: self.max_jitter as u32,
        }
    }
}
