//! IPv4 header access for fragment reassembly.

use std::net::Ipv4Addr;

use etherparse::Ipv4HeaderSlice;

use crate::error::ProtocolError;

/// Link-layer next-header values.
pub mod ethertype {
    /// IPv4
    pub const IPV4: u16 = 0x0800;
}

/// IP protocol number for UDP.
pub const IP_PROTO_UDP: u8 = 17;

/// The IPv4 header fields the reassembler needs, plus the bytes the header
/// covers (bounded by the total length, so link-layer padding is excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Packet<'a> {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub identification: u16,
    pub dont_fragment: bool,
    pub more_fragments: bool,
    /// Fragment offset in 8-byte units, with the control bits masked off.
    pub fragment_offset: u16,
    pub protocol: u8,
    pub total_len: u16,
    pub payload: &'a [u8],
}

impl<'a> Ipv4Packet<'a> {
    /// Decode an IPv4 header and slice out its payload.
    pub fn parse(data: &'a [u8]) -> Result<Self, ProtocolError> {
        let ipv4 = Ipv4HeaderSlice::from_slice(data).map_err(|e| ProtocolError::InvalidField {
            protocol: "ipv4",
            field: "header",
            reason: e.to_string(),
        })?;

        let header_len = ipv4.slice().len();
        let total_len = ipv4.total_len() as usize;
        if total_len < header_len {
            return Err(ProtocolError::InvalidField {
                protocol: "ipv4",
                field: "total_len",
                reason: format!("{total_len} is shorter than the {header_len}-byte header"),
            });
        }
        if total_len > data.len() {
            return Err(ProtocolError::PacketTooShort {
                protocol: "ipv4",
                needed: total_len,
                have: data.len(),
            });
        }

        Ok(Self {
            source: Ipv4Addr::from(ipv4.source()),
            destination: Ipv4Addr::from(ipv4.destination()),
            identification: ipv4.identification(),
            dont_fragment: ipv4.dont_fragment(),
            more_fragments: ipv4.more_fragments(),
            fragment_offset: ipv4.fragments_offset().value(),
            protocol: ipv4.protocol().0,
            total_len: ipv4.total_len(),
            payload: &data[header_len..total_len],
        })
    }

    /// Whether this packet is one piece of a fragmented datagram.
    pub fn is_fragment(&self) -> bool {
        self.more_fragments || self.fragment_offset != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4_udp() {
        let packet = [
            0x45, // Version (4) + IHL (5)
            0x00, // DSCP + ECN
            0x00, 0x1e, // Total length: 30
            0x12, 0x34, // Identification
            0x40, 0x00, // Don't fragment, offset 0
            0x80, // TTL: 128
            0x11, // Protocol: UDP (17)
            0x00, 0x00, // Checksum
            0x0a, 0x00, 0x00, 0x01, // Src: 10.0.0.1
            0x0a, 0x00, 0x00, 0x02, // Dst: 10.0.0.2
            // Payload (10 bytes)
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a,
            // Ethernet padding, not covered by total length
            0x00, 0x00,
        ];

        let ip = Ipv4Packet::parse(&packet).unwrap();
        assert_eq!(ip.source, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(ip.destination, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(ip.identification, 0x1234);
        assert_eq!(ip.protocol, IP_PROTO_UDP);
        assert!(ip.dont_fragment);
        assert!(!ip.is_fragment());
        assert_eq!(ip.payload.len(), 10);
    }

    #[test]
    fn test_fragment_offset_masks_flags() {
        let packet = [
            0x45, 0x00, 0x00, 0x18, // Version, IHL, Length: 24
            0xbe, 0xef, // Identification
            0x20, 0xb9, // More fragments, offset 185
            0x40, 0x11, 0x00, 0x00, // TTL, Protocol, Checksum
            0xc0, 0xa8, 0x01, 0x01, // Src
            0xc0, 0xa8, 0x01, 0x02, // Dst
            0xaa, 0xbb, 0xcc, 0xdd, // Payload
        ];

        let ip = Ipv4Packet::parse(&packet).unwrap();
        assert!(ip.more_fragments);
        assert!(!ip.dont_fragment);
        assert_eq!(ip.fragment_offset, 185);
        assert!(ip.is_fragment());
        assert_eq!(ip.payload, &[0xaa, 0xbb, 0xcc, 0xdd]);
    }

    #[test]
    fn test_truncated_capture() {
        let packet = [
            0x45, 0x00, 0x00, 0x40, // Total length: 64, but only 20 bytes captured
            0x00, 0x01, 0x00, 0x00, 0x40, 0x11, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x01, 0x0a, 0x00,
            0x00, 0x02,
        ];

        let err = Ipv4Packet::parse(&packet).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::PacketTooShort {
                protocol: "ipv4",
                needed: 64,
                have: 20,
            }
        );
    }

    #[test]
    fn test_parse_ipv4_too_short() {
        let short_header = [0x45, 0x00, 0x00, 0x28]; // Only 4 bytes
        assert!(Ipv4Packet::parse(&short_header).is_err());
    }
}
