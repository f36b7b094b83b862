//! Jitter buffer for RTP media streams.
//!
//! This crate sits between a network-facing producer that delivers RTP
//! packets as they arrive and a media consumer that drains them at a steady
//! cadence. It absorbs arrival-time variance, reorders packets that arrive
//! out of sequence, reports losses so the consumer can conceal them, and
//! tracks receive statistics including the RFC 3550 interarrival jitter
//! estimate.
//!
//! The library is organized into a few modules:
//!
//! - `packet`: RTP fixed-header codec and the media packet carrier
//! - `buffer`: the ordered buffer and its buffering/playout state machine
//! - `stats`: stream counters and the jitter estimator
//!
//! A buffer starts in the buffering state and refuses pops until the
//! nominal depth is reached, either by queued media or by elapsed warmup
//! time. One pushing thread and one popping thread can share a buffer
//! through an `Arc`; every operation serializes on an internal lock.

mod error;

pub mod buffer;
pub mod packet;
pub mod stats;

// Re-export core types
pub use error::Error;

pub use buffer::{JitterBuffer, JitterBufferConfig, PopResult, PushResult};
pub use packet::{MediaPacket, RtpHeader};
pub use stats::JitterStats;

/// Typedef for RTP timestamp values
pub type RtpTimestamp = u32;

/// Typedef for RTP sequence numbers
pub type RtpSequenceNumber = u16;

/// Typedef for RTP synchronization source identifiers
pub type RtpSsrc = u32;

/// Result type for jitter buffer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::{
        Error, JitterBuffer, JitterBufferConfig, JitterStats, MediaPacket, PopResult, PushResult,
        Result, RtpHeader, RtpSequenceNumber, RtpSsrc, RtpTimestamp,
    };
}
