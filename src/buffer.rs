//! Sequence-ordered jitter buffer with a buffering/playout state machine.
//!
//! A network thread feeds packets in with [`JitterBuffer::push`]; a media
//! thread drains them at its own cadence with [`JitterBuffer::pop`]. The
//! buffer absorbs arrival jitter by refusing pops until either the warmup
//! timer or the queued depth reaches the nominal depth, reorders packets
//! that arrive out of sequence, and reports gaps so the consumer can run
//! loss concealment. All operations serialize on one internal lock.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::Error;
use crate::packet::{MediaPacket, PAYLOAD_TYPE_DYNAMIC};
use crate::stats::{JitterStats, StreamStats};
use crate::{Result, RtpSequenceNumber};

/// Default warmup/playout depth in milliseconds (three 20 ms frames)
pub const DEFAULT_NOMINAL_DEPTH_MS: u32 = 60;

/// Default media clock rate for narrowband telephony audio
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 8000;

/// Jitter buffer configuration.
#[derive(Debug, Clone)]
pub struct JitterBufferConfig {
    /// Target depth: warmup ends once this much media is queued or this
    /// much wall-clock time has passed since warmup began
    pub nominal_depth_ms: u32,

    /// Hard depth ceiling; pushing past it evicts the oldest packet.
    /// Any value below the nominal depth selects `2 * nominal_depth_ms`.
    pub max_depth_ms: u32,

    /// Media clock rate, used to scale the jitter estimate
    pub sample_rate_hz: u32,
}

impl Default for JitterBufferConfig {
    fn default() -> Self {
        Self {
            nominal_depth_ms: DEFAULT_NOMINAL_DEPTH_MS,
            max_depth_ms: 0,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
        }
    }
}

impl JitterBufferConfig {
    /// Config with the given nominal depth and defaults for the rest.
    pub fn with_depth(nominal_depth_ms: u32) -> Self {
        Self {
            nominal_depth_ms,
            ..Default::default()
        }
    }
}

/// Outcome of a successful push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushResult {
    /// Packet inserted at its sequence position
    Stored,

    /// The depth ceiling was exceeded: the oldest packet was evicted to
    /// make room, and the new packet was still inserted
    Overflow,
}

/// Outcome of a pop.
#[derive(Debug)]
pub enum PopResult {
    /// The next packet in playout order
    Packet(MediaPacket),

    /// Warmup has not completed, or the queue has drained; retry after a
    /// pacing interval
    Buffering,

    /// A sequence gap was detected at the playout head. Nothing is
    /// delivered; the consumer should conceal one packet interval
    Dropped,

    /// Reserved. A drained queue currently reports [`PopResult::Buffering`]
    Empty,
}

#[derive(Debug)]
struct State {
    /// Packets ascending by sequence number, head first
    queue: VecDeque<(RtpSequenceNumber, MediaPacket)>,

    nominal_depth_ms: u32,
    max_depth_ms: u32,
    sample_rate_hz: u32,

    /// Milliseconds of media currently queued
    depth_ms: u32,

    /// Sequence at the queue head; mirrors the queue while it is
    /// non-empty, holds the last delivered sequence once it drains
    first_seq: RtpSequenceNumber,

    /// Sequence at the queue tail (most recent append)
    last_seq: RtpSequenceNumber,

    /// Sequence of the most recently delivered packet, or the sequence
    /// synthesized for a reported loss
    last_pop_seq: RtpSequenceNumber,

    /// Set when a pop drains the queue: the consumer has seen everything
    /// queued so far, and the next arrival belongs at the tail no matter
    /// what its sequence is. Cleared by every insertion
    caught_up: bool,

    /// Warmup gate: while set, pops refuse to deliver
    buffering: bool,

    /// When warmup began; stamped by the first push of a warmup cycle
    buffering_started: Option<Instant>,

    stats: StreamStats,
}

impl State {
    fn new(nominal_depth_ms: u32, max_depth_ms: u32, sample_rate_hz: u32) -> Self {
        let max_depth_ms = if max_depth_ms < nominal_depth_ms {
            nominal_depth_ms * 2
        } else {
            max_depth_ms
        };
        Self {
            queue: VecDeque::new(),
            nominal_depth_ms,
            max_depth_ms,
            sample_rate_hz,
            depth_ms: 0,
            first_seq: 0,
            last_seq: 0,
            last_pop_seq: 0,
            caught_up: false,
            buffering: true,
            buffering_started: None,
            stats: StreamStats::new(sample_rate_hz),
        }
    }
}

/// A fixed-depth jitter buffer for a single RTP stream.
///
/// Starts in the buffering state. Safe to share between one pushing and
/// one popping thread (wrap in an `Arc`); every method takes `&self` and
/// serializes on the internal lock.
#[derive(Debug)]
pub struct JitterBuffer {
    state: Mutex<State>,
}

impl Default for JitterBuffer {
    fn default() -> Self {
        Self::new(JitterBufferConfig::default())
    }
}

impl JitterBuffer {
    /// Create a buffer in the buffering state.
    pub fn new(config: JitterBufferConfig) -> Self {
        Self {
            state: Mutex::new(State::new(
                config.nominal_depth_ms,
                config.max_depth_ms,
                config.sample_rate_hz,
            )),
        }
    }

    /// Reinitialize in place: queue, statistics and sequence trackers are
    /// cleared and the given depth and clock rate take effect.
    pub fn init(&self, nominal_depth_ms: u32, sample_rate_hz: u32) {
        let mut state = self.state.lock().unwrap();
        *state = State::new(nominal_depth_ms, 0, sample_rate_hz);
    }

    /// Insert a packet at its sequence position.
    ///
    /// Returns [`PushResult::Overflow`] when the depth ceiling forced the
    /// oldest packet out (the new packet is still inserted), and an error
    /// for packets that cannot be decoded or that fall behind the playout
    /// head.
    pub fn push(&self, packet: MediaPacket) -> Result<PushResult> {
        let header = packet.header()?;
        let sequence = header.sequence;
        let now = Instant::now();

        let mut state = self.state.lock().unwrap();
        let mut result = PushResult::Stored;

        // Make room before inserting when the ceiling is already exceeded.
        if state.depth_ms > state.max_depth_ms {
            if let Some((evicted_seq, evicted)) = state.queue.pop_front() {
                state.depth_ms -= evicted.payload_ms;
                state.stats.overflows += 1;
                if let Some(head_seq) = state.queue.front().map(|(seq, _)| *seq) {
                    state.first_seq = head_seq;
                }
                warn!(
                    "jitter buffer overflow: evicted seq={} ({} ms still queued)",
                    evicted_seq, state.depth_ms
                );
                result = PushResult::Overflow;
            }
        }

        if state.buffering && state.buffering_started.is_none() {
            state.buffering_started = Some(now);
        }

        state.stats.record_arrival(header.timestamp, now);

        let payload_ms = packet.payload_ms;

        // Common case: the packet continues the stream, or the consumer
        // has already drained everything previously queued.
        if sequence >= state.last_seq
            || (sequence == 0 && state.last_seq == 0xFFFF)
            || state.caught_up
        {
            let was_empty = state.queue.is_empty();
            state.queue.push_back((sequence, packet));
            state.last_seq = sequence;
            state.depth_ms += payload_ms;
            state.caught_up = false;
            if was_empty {
                state.first_seq = sequence;
                state.last_pop_seq = sequence;
            }
            return Ok(result);
        }

        // Out-of-order handling compares promoted values, so a head at 0
        // never classifies anything as stale or head-adjacent.
        let seq = i32::from(sequence);
        let head = i32::from(state.first_seq);

        state.stats.out_of_order += 1;

        if seq < head - 1 {
            debug!(
                "discarding stale packet seq={} behind head seq={}",
                sequence, state.first_seq
            );
            return Err(Error::PacketTooOld {
                sequence,
                head: state.first_seq,
            });
        }

        if seq == head - 1 {
            debug!("out-of-order packet seq={} prepended at head", sequence);
            state.queue.push_front((sequence, packet));
            state.first_seq = sequence;
            state.depth_ms += payload_ms;
            state.caught_up = false;
            return Ok(result);
        }

        debug!(
            "out-of-order packet seq={} inserted within window",
            sequence
        );
        let position = state
            .queue
            .iter()
            .position(|(queued_seq, _)| *queued_seq > sequence)
            .unwrap_or(state.queue.len());
        state.queue.insert(position, (sequence, packet));
        state.depth_ms += payload_ms;
        state.caught_up = false;
        Ok(result)
    }

    /// Take the next packet in playout order.
    ///
    /// Refuses with [`PopResult::Buffering`] until warmup completes, and
    /// again whenever the queue drains. Reports a sequence gap once per
    /// missing packet with [`PopResult::Dropped`] before resuming
    /// delivery past it.
    pub fn pop(&self) -> PopResult {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap();

        if state.queue.is_empty() {
            state.stats.empty_reads += 1;
            if !state.buffering {
                // The warmup timestamp is stamped by the next push.
                state.buffering = true;
                debug!("queue drained, re-entering buffering");
            }
        } else if state.buffering {
            let timer_expired = state
                .buffering_started
                .map(|started| now.duration_since(started).as_millis() as u32)
                .is_some_and(|elapsed| elapsed >= state.nominal_depth_ms);
            if timer_expired || state.depth_ms > state.nominal_depth_ms {
                state.buffering = false;
                state.buffering_started = None;
                debug!(
                    "warmup complete ({} ms queued), entering playout",
                    state.depth_ms
                );
            }
        }

        if state.buffering || state.queue.is_empty() {
            return PopResult::Buffering;
        }

        let last_pop = i32::from(state.last_pop_seq);
        let head = i32::from(state.first_seq);

        let contiguous = state.last_pop_seq == state.first_seq
            || last_pop == head - 1
            || (state.last_pop_seq == 0xFFFF && state.first_seq == 0);

        if contiguous {
            let (sequence, mut packet) = state.queue.pop_front().unwrap();
            state.depth_ms -= packet.payload_ms;
            packet.use_redundant_payload = false;
            state.last_pop_seq = sequence;
            state.first_seq = match state.queue.front().map(|(next_seq, _)| *next_seq) {
                Some(next_seq) => next_seq,
                None => {
                    state.caught_up = true;
                    sequence
                }
            };
            return PopResult::Packet(packet);
        }

        // One packet short of the head, and the head frame carries a
        // redundant copy of it: deliver the head early as a shared view,
        // flagged so the decoder consumes the redundant block. The packet
        // stays queued for its own playout slot.
        let head_type = state.queue.front().unwrap().1.payload_type;
        if head_type == PAYLOAD_TYPE_DYNAMIC && last_pop == head - 2 {
            let mut recovered = state.queue.front().unwrap().1.clone();
            recovered.use_redundant_payload = true;
            state.last_pop_seq = state.first_seq;
            debug!(
                "recovering seq={} from redundant block of seq={}",
                last_pop + 1,
                state.first_seq
            );
            return PopResult::Packet(recovered);
        }

        // Gap between the last delivered packet and the head: report one
        // loss and advance so the next pop can line up with the head.
        state.last_pop_seq = state.last_pop_seq.wrapping_add(1);
        debug!(
            "gap at seq={}, head is seq={}",
            state.last_pop_seq, state.first_seq
        );
        PopResult::Dropped
    }

    /// Empty the queue and return to the buffering state. The configured
    /// depths and clock rate are kept; statistics are cleared.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        *state = State::new(
            state.nominal_depth_ms,
            state.max_depth_ms,
            state.sample_rate_hz,
        );
        debug!("jitter buffer reset");
    }

    /// Adjust the nominal and maximum depths. A `max_depth_ms` below the
    /// nominal depth (including 0) selects `2 * nominal_depth_ms`.
    pub fn set_depth(&self, nominal_depth_ms: u32, max_depth_ms: u32) {
        let mut state = self.state.lock().unwrap();
        state.nominal_depth_ms = nominal_depth_ms;
        state.max_depth_ms = if max_depth_ms < nominal_depth_ms {
            nominal_depth_ms * 2
        } else {
            max_depth_ms
        };
    }

    /// Number of packets currently queued.
    pub fn depth(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    /// Milliseconds of media currently queued.
    pub fn depth_ms(&self) -> u32 {
        self.state.lock().unwrap().depth_ms
    }

    /// The configured nominal depth.
    pub fn nominal_depth_ms(&self) -> u32 {
        self.state.lock().unwrap().nominal_depth_ms
    }

    /// Whether pops are currently refused pending warmup.
    pub fn is_buffering(&self) -> bool {
        self.state.lock().unwrap().buffering
    }

    /// The caller observed end of transmission: zero the sequence
    /// trackers so the next talk spurt starts from a clean slate.
    pub fn end_of_transmission(&self) {
        let mut state = self.state.lock().unwrap();
        state.first_seq = 0;
        state.last_seq = 0;
        state.last_pop_seq = 0;
        debug!("end of transmission, sequence trackers cleared");
    }

    /// Snapshot of the stream statistics.
    pub fn stats(&self) -> JitterStats {
        self.state.lock().unwrap().stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{RtpHeader, PAYLOAD_TYPE_PCMU};
    use bytes::{BufMut, BytesMut};
    use std::time::Duration;

    fn packet_with(sequence: u16, payload_ms: u32, payload_type: u8) -> MediaPacket {
        let mut buf = BytesMut::new();
        let timestamp = 8000 + u32::from(sequence) * 160;
        RtpHeader::new(payload_type, sequence, timestamp, 0x5eed_cafe).serialize(&mut buf);
        buf.put_slice(&[0u8; 16]);
        MediaPacket::new(buf.freeze(), payload_ms, payload_type)
    }

    fn packet(sequence: u16) -> MediaPacket {
        packet_with(sequence, 20, PAYLOAD_TYPE_PCMU)
    }

    fn pop_packet(buffer: &JitterBuffer) -> MediaPacket {
        match buffer.pop() {
            PopResult::Packet(packet) => packet,
            other => panic!("expected a packet, got {:?}", other),
        }
    }

    fn pop_sequence(buffer: &JitterBuffer) -> u16 {
        pop_packet(buffer).sequence().unwrap()
    }

    #[test]
    fn test_starts_buffering() {
        let buffer = JitterBuffer::default();
        assert!(buffer.is_buffering());
        assert!(matches!(buffer.pop(), PopResult::Buffering));
        assert_eq!(buffer.stats().empty_reads, 1);
    }

    #[test]
    fn test_in_order_delivery() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(30));

        for seq in 100..103 {
            assert_eq!(buffer.push(packet(seq)).unwrap(), PushResult::Stored);
        }
        assert_eq!(buffer.depth(), 3);
        assert_eq!(buffer.depth_ms(), 60);

        // 60 ms queued against a 30 ms nominal depth ends warmup.
        assert_eq!(pop_sequence(&buffer), 100);
        assert!(!buffer.is_buffering());
        assert_eq!(pop_sequence(&buffer), 101);
        assert_eq!(pop_sequence(&buffer), 102);

        assert!(matches!(buffer.pop(), PopResult::Buffering));
        assert!(buffer.is_buffering());
        assert_eq!(buffer.stats().out_of_order, 0);
    }

    #[test]
    fn test_reordered_within_window() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(60));

        buffer.push(packet(10)).unwrap();
        buffer.push(packet(12)).unwrap();
        buffer.push(packet(11)).unwrap();
        buffer.push(packet(13)).unwrap();

        assert_eq!(buffer.stats().out_of_order, 1);
        for expected in 10..14 {
            assert_eq!(pop_sequence(&buffer), expected);
        }
    }

    #[test]
    fn test_gap_reported_once() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(30));

        buffer.push(packet(20)).unwrap();
        buffer.push(packet(22)).unwrap();

        assert_eq!(pop_sequence(&buffer), 20);
        assert!(matches!(buffer.pop(), PopResult::Dropped));
        assert_eq!(pop_sequence(&buffer), 22);
        assert_eq!(buffer.stats().out_of_order, 0);
    }

    #[test]
    fn test_stale_packet_rejected() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(30));

        buffer.push(packet(50)).unwrap();
        buffer.push(packet(51)).unwrap();
        buffer.push(packet(52)).unwrap();
        assert_eq!(pop_sequence(&buffer), 50);
        assert_eq!(pop_sequence(&buffer), 51);

        let err = buffer.push(packet(40)).unwrap_err();
        assert_eq!(
            err,
            Error::PacketTooOld {
                sequence: 40,
                head: 52,
            }
        );
        assert_eq!(buffer.stats().out_of_order, 1);
        assert_eq!(buffer.depth(), 1);
    }

    #[test]
    fn test_overflow_evicts_head() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(60));

        // 120 ms ceiling: seven 20 ms packets fit (the depth is checked
        // before each insertion), the eighth forces the head out.
        for seq in 1..8 {
            assert_eq!(buffer.push(packet(seq)).unwrap(), PushResult::Stored);
        }
        assert_eq!(buffer.depth_ms(), 140);
        assert_eq!(buffer.stats().overflows, 0);

        assert_eq!(buffer.push(packet(8)).unwrap(), PushResult::Overflow);
        assert_eq!(buffer.stats().overflows, 1);
        assert_eq!(buffer.depth(), 7);
        assert_eq!(buffer.depth_ms(), 140);

        for expected in 2..9 {
            assert_eq!(pop_sequence(&buffer), expected);
        }
    }

    #[test]
    fn test_prepend_rejoins_head() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(30));

        buffer.push(packet(10)).unwrap();
        buffer.push(packet(11)).unwrap();
        buffer.push(packet(12)).unwrap();
        assert_eq!(pop_sequence(&buffer), 10);

        // A copy of the just-delivered packet slots back in ahead of the
        // head rather than at the tail.
        assert_eq!(buffer.push(packet(10)).unwrap(), PushResult::Stored);
        assert_eq!(buffer.stats().out_of_order, 1);

        assert_eq!(pop_sequence(&buffer), 10);
        assert_eq!(pop_sequence(&buffer), 11);
        assert_eq!(pop_sequence(&buffer), 12);
    }

    #[test]
    fn test_sequence_wraparound() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(60));

        for seq in [0xFFFE, 0xFFFF, 0x0000, 0x0001] {
            buffer.push(packet(seq)).unwrap();
        }
        assert_eq!(buffer.stats().out_of_order, 0);

        for expected in [0xFFFE, 0xFFFF, 0x0000, 0x0001] {
            assert_eq!(pop_sequence(&buffer), expected);
        }
        assert!(matches!(buffer.pop(), PopResult::Buffering));
    }

    #[test]
    fn test_redundant_payload_recovery() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(30));

        buffer
            .push(packet_with(30, 20, PAYLOAD_TYPE_DYNAMIC))
            .unwrap();
        buffer
            .push(packet_with(32, 20, PAYLOAD_TYPE_DYNAMIC))
            .unwrap();

        let first = pop_packet(&buffer);
        assert_eq!(first.sequence().unwrap(), 30);
        assert!(!first.use_redundant_payload);

        // Seq 31 is missing, but the next frame carries a redundant copy:
        // it is delivered early, flagged, and stays queued.
        let recovered = pop_packet(&buffer);
        assert_eq!(recovered.sequence().unwrap(), 32);
        assert!(recovered.use_redundant_payload);
        assert_eq!(buffer.depth(), 1);
        assert_eq!(buffer.depth_ms(), 20);

        let primary = pop_packet(&buffer);
        assert_eq!(primary.sequence().unwrap(), 32);
        assert!(!primary.use_redundant_payload);
        assert_eq!(buffer.depth(), 0);
    }

    #[test]
    fn test_depth_tracks_payload_durations() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(100));

        buffer.push(packet_with(1, 10, PAYLOAD_TYPE_PCMU)).unwrap();
        buffer.push(packet_with(2, 30, PAYLOAD_TYPE_PCMU)).unwrap();
        buffer.push(packet_with(3, 20, PAYLOAD_TYPE_PCMU)).unwrap();
        assert_eq!(buffer.depth_ms(), 60);

        buffer.push(packet_with(4, 60, PAYLOAD_TYPE_PCMU)).unwrap();
        assert_eq!(buffer.depth_ms(), 120);

        pop_packet(&buffer);
        assert_eq!(buffer.depth_ms(), 110);
        pop_packet(&buffer);
        assert_eq!(buffer.depth_ms(), 80);
    }

    #[test]
    fn test_set_depth_picks_double_for_low_max() {
        let buffer = JitterBuffer::new(JitterBufferConfig::default());
        buffer.set_depth(20, 0);
        assert_eq!(buffer.nominal_depth_ms(), 20);

        // Ceiling resolved to 40 ms: the fourth 20 ms packet overflows.
        buffer.push(packet(1)).unwrap();
        buffer.push(packet(2)).unwrap();
        assert_eq!(buffer.push(packet(3)).unwrap(), PushResult::Stored);
        assert_eq!(buffer.push(packet(4)).unwrap(), PushResult::Overflow);
    }

    #[test]
    fn test_warmup_timer_path() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(50));

        buffer.push(packet(600)).unwrap();
        assert!(matches!(buffer.pop(), PopResult::Buffering));

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(pop_sequence(&buffer), 600);
    }

    #[test]
    fn test_reset_clears_everything() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(30));

        buffer.push(packet(7)).unwrap();
        buffer.push(packet(9)).unwrap();
        pop_packet(&buffer);
        buffer.pop();

        buffer.reset();
        assert!(buffer.is_buffering());
        assert_eq!(buffer.depth(), 0);
        assert_eq!(buffer.depth_ms(), 0);
        assert_eq!(buffer.stats(), JitterStats::default());
        assert!(matches!(buffer.pop(), PopResult::Buffering));
    }

    #[test]
    fn test_init_applies_new_depth() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(200));
        buffer.push(packet(1)).unwrap();

        buffer.init(30, 8000);
        assert_eq!(buffer.nominal_depth_ms(), 30);
        assert_eq!(buffer.depth(), 0);

        buffer.push(packet(1)).unwrap();
        buffer.push(packet(2)).unwrap();
        assert_eq!(pop_sequence(&buffer), 1);
    }

    #[test]
    fn test_end_of_transmission_restarts_numbering() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(30));

        buffer.push(packet(7000)).unwrap();
        buffer.push(packet(7001)).unwrap();
        assert_eq!(pop_sequence(&buffer), 7000);
        assert_eq!(pop_sequence(&buffer), 7001);

        buffer.end_of_transmission();

        // A fresh talk spurt from a low sequence plays out cleanly.
        buffer.push(packet(100)).unwrap();
        buffer.push(packet(101)).unwrap();
        assert_eq!(pop_sequence(&buffer), 100);
        assert_eq!(pop_sequence(&buffer), 101);
    }

    #[test]
    fn test_undecodable_packet_rejected() {
        let buffer = JitterBuffer::default();
        let runt = MediaPacket::new(vec![0x80u8, 0x00], 20, PAYLOAD_TYPE_PCMU);
        assert!(matches!(
            buffer.push(runt),
            Err(Error::BufferTooSmall { .. })
        ));
        assert_eq!(buffer.depth(), 0);
    }

    #[test]
    fn test_rebuffers_after_drain() {
        let buffer = JitterBuffer::new(JitterBufferConfig::with_depth(30));

        buffer.push(packet(40)).unwrap();
        buffer.push(packet(41)).unwrap();
        assert_eq!(pop_sequence(&buffer), 40);
        assert_eq!(pop_sequence(&buffer), 41);
        assert!(matches!(buffer.pop(), PopResult::Buffering));

        // Enough new depth ends the second warmup immediately.
        buffer.push(packet(42)).unwrap();
        buffer.push(packet(43)).unwrap();
        assert_eq!(pop_sequence(&buffer), 42);
        assert_eq!(pop_sequence(&buffer), 43);
        assert!(buffer.stats().empty_reads >= 1);
    }
}
