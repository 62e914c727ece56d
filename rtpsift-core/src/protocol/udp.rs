//! UDP header access.

use etherparse::UdpHeaderSlice;

use crate::error::ProtocolError;

/// UDP header is always 8 bytes.
pub const UDP_HEADER_LEN: usize = 8;

/// Decoded UDP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    /// Length of header plus data, as declared by the sender.
    pub length: u16,
    pub checksum: u16,
}

impl UdpHeader {
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        let udp = UdpHeaderSlice::from_slice(data).map_err(|e| ProtocolError::InvalidField {
            protocol: "udp",
            field: "header",
            reason: e.to_string(),
        })?;

        Ok(Self {
            src_port: udp.source_port(),
            dst_port: udp.destination_port(),
            length: udp.length(),
            checksum: udp.checksum(),
        })
    }

    /// Number of data bytes following the header, as declared.
    pub fn data_len(&self) -> Result<usize, ProtocolError> {
        (self.length as usize)
            .checked_sub(UDP_HEADER_LEN)
            .ok_or_else(|| ProtocolError::InvalidField {
                protocol: "udp",
                field: "length",
                reason: format!("{} is shorter than the header", self.length),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_udp() {
        let header = [
            0x30, 0x39, // Src port: 12345
            0x1f, 0x40, // Dst port: 8000
            0x00, 0xb4, // Length: 180
            0x00, 0x00, // Checksum
        ];

        let udp = UdpHeader::parse(&header).unwrap();
        assert_eq!(udp.src_port, 12345);
        assert_eq!(udp.dst_port, 8000);
        assert_eq!(udp.data_len().unwrap(), 172);
    }

    #[test]
    fn test_length_shorter_than_header() {
        let header = [0x00, 0x01, 0x00, 0x02, 0x00, 0x04, 0x00, 0x00];

        let udp = UdpHeader::parse(&header).unwrap();
        assert!(udp.data_len().is_err());
    }

    #[test]
    fn test_too_short() {
        assert!(UdpHeader::parse(&[0x00, 0x35, 0x00]).is_err());
    }
}
