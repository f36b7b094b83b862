//! RTP fixed-header codec and the media packet carrier.
//!
//! Only the 12-byte fixed header (RFC 3550 §5.1) and the extension flag are
//! decoded here. CSRC lists, full extension contents, and payload framing
//! beyond the dynamic-payload redundancy preamble are left to the consumer.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::Error;
use crate::{Result, RtpSequenceNumber, RtpSsrc, RtpTimestamp};

/// RTP protocol version (always 2 in practice)
pub const RTP_VERSION: u8 = 2;

/// Size of the fixed RTP header in bytes (no CSRC list, no extension)
pub const RTP_HEADER_LENGTH: usize = 12;

// Flag masks over the first two header bytes, read as one big-endian u16.
pub const RTP_FLAGS_VERSION: u16 = 0xC000;
pub const RTP_FLAGS_PADDING: u16 = 0x2000;
pub const RTP_FLAGS_EXTENSION: u16 = 0x1000;
pub const RTP_FLAGS_CSRC_COUNT: u16 = 0x0F00;
pub const RTP_FLAGS_MARKER: u16 = 0x0080;
pub const RTP_FLAGS_PAYLOAD_TYPE: u16 = 0x007F;

// Static audio payload type codes.
pub const PAYLOAD_TYPE_PCMU: u8 = 0x00;
pub const PAYLOAD_TYPE_GSM: u8 = 0x03;
pub const PAYLOAD_TYPE_L16: u8 = 0x0B;
pub const PAYLOAD_TYPE_G729A: u8 = 0x12;
pub const PAYLOAD_TYPE_SPEEX: u8 = 0x61;

/// Dynamic payload type whose frames carry a redundant copy of the
/// previous frame ahead of the primary payload.
pub const PAYLOAD_TYPE_DYNAMIC: u8 = 0x79;

/// Decoded RTP fixed header.
///
/// The first two bytes are kept as the raw flags word; the accessor
/// methods apply the documented masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    /// V, P, X, CC, M and PT bits, host order
    pub flags: u16,

    /// Sequence number
    pub sequence: RtpSequenceNumber,

    /// Media clock timestamp
    pub timestamp: RtpTimestamp,

    /// Synchronization source identifier
    pub ssrc: RtpSsrc,
}

impl RtpHeader {
    /// Create a header with the version bits set and the given fields.
    pub fn new(
        payload_type: u8,
        sequence: RtpSequenceNumber,
        timestamp: RtpTimestamp,
        ssrc: RtpSsrc,
    ) -> Self {
        let flags = (u16::from(RTP_VERSION) << 14) | u16::from(payload_type & 0x7F);
        Self {
            flags,
            sequence,
            timestamp,
            ssrc,
        }
    }

    /// Parse the fixed header from the start of a datagram.
    pub fn parse(buf: &mut impl Buf) -> Result<Self> {
        if buf.remaining() < RTP_HEADER_LENGTH {
            return Err(Error::BufferTooSmall {
                required: RTP_HEADER_LENGTH,
                available: buf.remaining(),
            });
        }

        let flags = buf.get_u16();
        let sequence = buf.get_u16();
        let timestamp = buf.get_u32();
        let ssrc = buf.get_u32();

        Ok(Self {
            flags,
            sequence,
            timestamp,
            ssrc,
        })
    }

    /// Serialize the fixed header in network byte order.
    pub fn serialize(&self, buf: &mut BytesMut) {
        buf.reserve(RTP_HEADER_LENGTH);
        buf.put_u16(self.flags);
        buf.put_u16(self.sequence);
        buf.put_u32(self.timestamp);
        buf.put_u32(self.ssrc);
    }

    /// Protocol version from the V bits
    pub fn version(&self) -> u8 {
        ((self.flags & RTP_FLAGS_VERSION) >> 14) as u8
    }

    /// Padding flag
    pub fn padding(&self) -> bool {
        self.flags & RTP_FLAGS_PADDING != 0
    }

    /// Extension flag
    pub fn extension(&self) -> bool {
        self.flags & RTP_FLAGS_EXTENSION != 0
    }

    /// Number of CSRC entries following the fixed header
    pub fn csrc_count(&self) -> u8 {
        ((self.flags & RTP_FLAGS_CSRC_COUNT) >> 8) as u8
    }

    /// Marker bit
    pub fn marker(&self) -> bool {
        self.flags & RTP_FLAGS_MARKER != 0
    }

    /// 7-bit payload type code
    pub fn payload_type(&self) -> u8 {
        (self.flags & RTP_FLAGS_PAYLOAD_TYPE) as u8
    }

    /// Synchronization source identifier
    pub fn ssrc(&self) -> RtpSsrc {
        self.ssrc
    }
}

/// An owned RTP datagram plus the caller-annotated playout metadata.
///
/// The producer fills in `payload_ms` and `payload_type` before handing the
/// packet to the buffer; the buffer sets `use_redundant_payload` before a
/// packet is yielded back so the decoder knows which block to consume. The
/// raw bytes are held in a refcounted [`Bytes`], so a packet can be yielded
/// as a shared view without copying the payload.
#[derive(Debug, Clone)]
pub struct MediaPacket {
    /// The raw RTP datagram as received from the wire
    pub data: Bytes,

    /// Duration of media represented by this packet, in milliseconds
    pub payload_ms: u32,

    /// 7-bit payload type, extracted from the header or supplied
    pub payload_type: u8,

    /// Caller-annotated payload length hint, not interpreted here
    pub payload_bytes: u16,

    /// Set by the buffer when the redundant block should be decoded
    /// instead of the primary payload
    pub use_redundant_payload: bool,
}

impl MediaPacket {
    /// Wrap a raw datagram. No validation happens here; the buffer decodes
    /// and rejects undecodable packets on push.
    pub fn new(data: impl Into<Bytes>, payload_ms: u32, payload_type: u8) -> Self {
        Self {
            data: data.into(),
            payload_ms,
            payload_type,
            payload_bytes: 0,
            use_redundant_payload: false,
        }
    }

    /// Decode the fixed header.
    pub fn header(&self) -> Result<RtpHeader> {
        let mut buf = self.data.clone();
        RtpHeader::parse(&mut buf)
    }

    /// Sequence number from the header.
    pub fn sequence(&self) -> Result<RtpSequenceNumber> {
        Ok(self.header()?.sequence)
    }

    /// Media timestamp from the header.
    pub fn timestamp(&self) -> Result<RtpTimestamp> {
        Ok(self.header()?.timestamp)
    }

    /// Byte offset where the primary payload starts.
    ///
    /// Skips the fixed header, the extension block when the X bit is set,
    /// and for dynamic-payload packets the redundancy preamble (3 bytes),
    /// the redundant-block length byte, the redundant block itself and the
    /// primary payload type byte. CSRC entries are not accounted for.
    pub fn payload_offset(&self) -> Result<usize> {
        let header = self.header()?;
        let len = self.data.len();
        let mut offset = RTP_HEADER_LENGTH;

        if header.extension() {
            if offset + 4 > len {
                return Err(Error::InvalidPacket(
                    "extension header overruns packet".to_string(),
                ));
            }
            let ext_words =
                u16::from_be_bytes([self.data[offset + 2], self.data[offset + 3]]) as usize;
            offset += 4 + 4 * ext_words;
            if offset > len {
                return Err(Error::InvalidPacket(format!(
                    "extension of {} words overruns {} byte packet",
                    ext_words, len
                )));
            }
        }

        if header.payload_type() == PAYLOAD_TYPE_DYNAMIC {
            if offset + 4 > len {
                return Err(Error::InvalidPacket(
                    "redundancy preamble overruns packet".to_string(),
                ));
            }
            let redundant_len = self.data[offset + 3] as usize;
            offset += 4 + redundant_len + 1;
            if offset > len {
                return Err(Error::InvalidPacket(format!(
                    "redundant block of {} bytes overruns {} byte packet",
                    redundant_len, len
                )));
            }
        }

        Ok(offset)
    }

    /// The primary payload bytes.
    pub fn payload(&self) -> Result<&[u8]> {
        let offset = self.payload_offset()?;
        Ok(&self.data[offset..])
    }
}
