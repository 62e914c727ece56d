//! RTP fixed header codec.
//!
//! Only the 12-byte fixed header is interpreted. CSRC lists and extensions
//! are left in the payload, which is what the analyzer's framing expects:
//! audio frames are sized and classified from the byte after the fixed
//! header.

use bytes::Bytes;

use crate::error::ProtocolError;

/// Size of the fixed RTP header.
pub const RTP_HEADER_LEN: usize = 12;

/// Expected version/flags byte: version 2, no padding, no extension, no CSRCs.
pub const RTP_VERSION_BYTE: u8 = 0x80;

/// Marker bit in the second header byte.
pub const MARKER_BIT: u8 = 0x80;

/// Comfort-noise payload type.
pub const COMFORT_NOISE_PAYLOAD: u8 = 13;

/// The fixed RTP header as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    /// Version, padding, extension and CSRC count.
    pub version_flags: u8,
    /// Marker bit and payload type.
    pub marker_payload: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
}

impl RtpHeader {
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < RTP_HEADER_LEN {
            return Err(ProtocolError::PacketTooShort {
                protocol: "rtp",
                needed: RTP_HEADER_LEN,
                have: data.len(),
            });
        }

        Ok(Self {
            version_flags: data[0],
            marker_payload: data[1],
            sequence: u16::from_be_bytes([data[2], data[3]]),
            timestamp: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            ssrc: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; RTP_HEADER_LEN] {
        let mut out = [0u8; RTP_HEADER_LEN];
        out[0] = self.version_flags;
        out[1] = self.marker_payload;
        out[2..4].copy_from_slice(&self.sequence.to_be_bytes());
        out[4..8].copy_from_slice(&self.timestamp.to_be_bytes());
        out[8..12].copy_from_slice(&self.ssrc.to_be_bytes());
        out
    }

    /// Payload type with the marker bit masked off.
    #[inline]
    pub fn payload_type(&self) -> u8 {
        self.marker_payload & !MARKER_BIT
    }

    /// Marker bit: set on the first packet of a talk spurt.
    #[inline]
    pub fn marker(&self) -> bool {
        self.marker_payload & MARKER_BIT != 0
    }

    #[inline]
    pub fn is_comfort_noise(&self) -> bool {
        self.payload_type() == COMFORT_NOISE_PAYLOAD
    }
}

/// An RTP header with the payload bytes that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    pub header: RtpHeader,
    pub payload: Bytes,
}

impl RtpPacket {
    /// Split a frame that begins with an RTP header.
    pub fn parse(frame: Bytes) -> Result<Self, ProtocolError> {
        let header = RtpHeader::parse(&frame)?;
        let payload = frame.slice(RTP_HEADER_LEN..);
        Ok(Self { header, payload })
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Header followed by payload, as it was carried in the UDP datagram.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RTP_HEADER_LEN + self.payload.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rtp_header() {
        let data = [
            0x80, // V=2
            0x80, // Marker set, PT 0 (PCMU)
            0x12, 0x34, // Sequence
            0x00, 0x00, 0x0a, 0x00, // Timestamp: 2560
            0xde, 0xad, 0xbe, 0xef, // SSRC
            0xff, 0xff, // Payload
        ];

        let header = RtpHeader::parse(&data).unwrap();
        assert_eq!(header.version_flags, RTP_VERSION_BYTE);
        assert!(header.marker());
        assert_eq!(header.payload_type(), 0);
        assert_eq!(header.sequence, 0x1234);
        assert_eq!(header.timestamp, 2560);
        assert_eq!(header.ssrc, 0xdeadbeef);
        assert_eq!(&header.to_bytes()[..], &data[..RTP_HEADER_LEN]);
    }

    #[test]
    fn test_packet_splits_payload() {
        let mut frame = vec![0x80, 0x0d, 0x00, 0x01, 0, 0, 0, 0, 0, 0, 0, 1];
        frame.push(0x40); // comfort noise level
        let packet = RtpPacket::parse(Bytes::from(frame.clone())).unwrap();

        assert!(packet.header.is_comfort_noise());
        assert!(!packet.header.marker());
        assert_eq!(packet.payload_len(), 1);
        assert_eq!(packet.to_bytes(), frame);
    }

    #[test]
    fn test_header_too_short() {
        let err = RtpHeader::parse(&[0x80, 0x00, 0x00]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::PacketTooShort {
                protocol: "rtp",
                needed: 12,
                have: 3,
            }
        );
    }
}
