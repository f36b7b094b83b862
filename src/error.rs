use thiserror::Error;

/// Error type for jitter buffer operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Packet could not be decoded as RTP
    #[error("Invalid RTP packet: {0}")]
    InvalidPacket(String),

    /// Buffer too small to hold the fixed RTP header
    #[error("Buffer too small for RTP packet: need {required} but have {available}")]
    BufferTooSmall {
        required: usize,
        available: usize,
    },

    /// Packet arrived too far behind the playout head to be inserted
    #[error("Packet seq={sequence} is older than playout head seq={head}")]
    PacketTooOld {
        sequence: u16,
        head: u16,
    },

    /// Invalid parameter for a buffer operation
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let packet_err = Error::InvalidPacket("truncated extension".to_string());
        assert_eq!(
            packet_err.to_string(),
            "Invalid RTP packet: truncated extension"
        );

        let buffer_err = Error::BufferTooSmall {
            required: 12,
            available: 4,
        };
        assert_eq!(
            buffer_err.to_string(),
            "Buffer too small for RTP packet: need 12 but have 4"
        );

        let old_err = Error::PacketTooOld {
            sequence: 7,
            head: 42,
        };
        assert!(old_err.to_string().contains("seq=7"));
    }
}
