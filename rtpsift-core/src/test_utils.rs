//! Test utilities for building captures.
//!
//! Provides builders for RTP, UDP and IPv4 headers, an IPv4 fragmenter, and
//! a snoop capture builder, so unit tests, integration tests and fuzz targets
//! can construct byte-exact inputs.

use crate::capture::snoop::{SNOOP_FILE_HEADER_LEN, SNOOP_RECORD_HEADER_LEN};
use crate::protocol::ethertype;

/// Builder for constructing RTP frames (fixed header + payload).
#[derive(Debug, Clone)]
pub struct RtpBuilder {
    version_flags: u8,
    marker: bool,
    payload_type: u8,
    sequence: u16,
    timestamp: u32,
    ssrc: u32,
    payload: Vec<u8>,
}

impl Default for RtpBuilder {
    fn default() -> Self {
        Self {
            version_flags: 0x80,
            marker: false,
            payload_type: 0, // PCMU
            sequence: 1,
            timestamp: 0,
            ssrc: 0x1234_5678,
            payload: vec![0xff; 160],
        }
    }
}

impl RtpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version_flags(mut self, byte: u8) -> Self {
        self.version_flags = byte;
        self
    }

    pub fn marker(mut self, marker: bool) -> Self {
        self.marker = marker;
        self
    }

    pub fn payload_type(mut self, payload_type: u8) -> Self {
        self.payload_type = payload_type;
        self
    }

    pub fn sequence(mut self, sequence: u16) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn ssrc(mut self, ssrc: u32) -> Self {
        self.ssrc = ssrc;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(12 + self.payload.len());
        frame.push(self.version_flags);
        frame.push(if self.marker { 0x80 } else { 0x00 } | (self.payload_type & 0x7f));
        frame.extend_from_slice(&self.sequence.to_be_bytes());
        frame.extend_from_slice(&self.timestamp.to_be_bytes());
        frame.extend_from_slice(&self.ssrc.to_be_bytes());
        frame.extend_from_slice(&self.payload);
        frame
    }
}

/// Builder for constructing UDP datagrams.
#[derive(Debug, Clone)]
pub struct UdpBuilder {
    src_port: u16,
    dst_port: u16,
    payload: Vec<u8>,
}

impl Default for UdpBuilder {
    fn default() -> Self {
        Self {
            src_port: 5004,
            dst_port: 5004,
            payload: Vec::new(),
        }
    }
}

impl UdpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src_port(mut self, port: u16) -> Self {
        self.src_port = port;
        self
    }

    pub fn dst_port(mut self, port: u16) -> Self {
        self.dst_port = port;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let length = 8 + self.payload.len() as u16;
        let mut datagram = Vec::with_capacity(length as usize);
        datagram.extend_from_slice(&self.src_port.to_be_bytes());
        datagram.extend_from_slice(&self.dst_port.to_be_bytes());
        datagram.extend_from_slice(&length.to_be_bytes());
        datagram.extend_from_slice(&[0x00, 0x00]); // Checksum (not calculated)
        datagram.extend_from_slice(&self.payload);
        datagram
    }
}

/// Builder for constructing IPv4 packets.
#[derive(Debug, Clone)]
pub struct Ipv4Builder {
    identification: u16,
    more_fragments: bool,
    fragment_offset: u16,
    ttl: u8,
    protocol: u8,
    src_ip: [u8; 4],
    dst_ip: [u8; 4],
    payload: Vec<u8>,
}

impl Default for Ipv4Builder {
    fn default() -> Self {
        Self {
            identification: 0x0001,
            more_fragments: false,
            fragment_offset: 0,
            ttl: 64,
            protocol: 17, // UDP
            src_ip: [192, 168, 1, 1],
            dst_ip: [192, 168, 1, 2],
            payload: Vec::new(),
        }
    }
}

impl Ipv4Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    pub fn more_fragments(mut self, more: bool) -> Self {
        self.more_fragments = more;
        self
    }

    /// Fragment offset in 8-byte units.
    pub fn fragment_offset(mut self, offset: u16) -> Self {
        self.fragment_offset = offset;
        self
    }

    pub fn protocol(mut self, protocol: u8) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn src_ip(mut self, ip: [u8; 4]) -> Self {
        self.src_ip = ip;
        self
    }

    pub fn dst_ip(mut self, ip: [u8; 4]) -> Self {
        self.dst_ip = ip;
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let total_length = 20 + self.payload.len() as u16;
        let flags_fragment =
            (if self.more_fragments { 0x2000 } else { 0 }) | (self.fragment_offset & 0x1fff);
        let mut packet = Vec::with_capacity(total_length as usize);

        packet.push(0x45); // Version 4, IHL 5
        packet.push(0x00); // DSCP + ECN
        packet.extend_from_slice(&total_length.to_be_bytes());
        packet.extend_from_slice(&self.identification.to_be_bytes());
        packet.extend_from_slice(&flags_fragment.to_be_bytes());
        packet.push(self.ttl);
        packet.push(self.protocol);
        packet.extend_from_slice(&[0x00, 0x00]); // Checksum (not calculated)
        packet.extend_from_slice(&self.src_ip);
        packet.extend_from_slice(&self.dst_ip);
        packet.extend_from_slice(&self.payload);
        packet
    }
}

/// Split an IP payload (normally a whole UDP datagram) into IPv4 fragments.
///
/// `chunk` is the IP payload size of every fragment but the last and is
/// rounded down to a multiple of 8.
pub fn fragment_ipv4(template: Ipv4Builder, ip_payload: &[u8], chunk: usize) -> Vec<Vec<u8>> {
    let chunk = (chunk / 8).max(1) * 8;
    let pieces: Vec<&[u8]> = ip_payload.chunks(chunk).collect();
    let last = pieces.len().saturating_sub(1);

    pieces
        .iter()
        .enumerate()
        .map(|(i, piece)| {
            template
                .clone()
                .fragment_offset((i * chunk / 8) as u16)
                .more_fragments(i != last)
                .payload(piece.to_vec())
                .build()
        })
        .collect()
}

/// Builder for snoop captures (big-endian, Ethernet datalink).
#[derive(Debug, Clone, Default)]
pub struct SnoopCaptureBuilder {
    records: Vec<u8>,
}

impl SnoopCaptureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an Ethernet frame carrying `payload` with the given ethertype.
    pub fn frame(mut self, secs: u32, micros: u32, next_header: u16, payload: &[u8]) -> Self {
        let mut frame = Vec::with_capacity(14 + payload.len());
        frame.extend_from_slice(&[0x08, 0x00, 0x20, 0x01, 0x02, 0x03]); // Dst MAC
        frame.extend_from_slice(&[0x08, 0x00, 0x20, 0x0a, 0x0b, 0x0c]); // Src MAC
        frame.extend_from_slice(&next_header.to_be_bytes());
        frame.extend_from_slice(payload);
        self.push_record(secs, micros, &frame);
        self
    }

    /// Append an IPv4 packet in an Ethernet frame.
    pub fn ipv4(self, secs: u32, micros: u32, packet: &[u8]) -> Self {
        self.frame(secs, micros, ethertype::IPV4, packet)
    }

    /// Append raw bytes verbatim (for corrupt-record tests).
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.records.extend_from_slice(bytes);
        self
    }

    fn push_record(&mut self, secs: u32, micros: u32, frame: &[u8]) {
        let included = frame.len();
        let record_len = (SNOOP_RECORD_HEADER_LEN + included + 3) & !3;

        self.records.extend_from_slice(&(included as u32).to_be_bytes()); // Original length
        self.records.extend_from_slice(&(included as u32).to_be_bytes()); // Included length
        self.records.extend_from_slice(&(record_len as u32).to_be_bytes()); // Record length
        self.records.extend_from_slice(&0u32.to_be_bytes()); // Cumulative drops
        self.records.extend_from_slice(&secs.to_be_bytes());
        self.records.extend_from_slice(&micros.to_be_bytes());
        self.records.extend_from_slice(frame);
        let padding = record_len - SNOOP_RECORD_HEADER_LEN - included;
        self.records.extend(std::iter::repeat(0u8).take(padding));
    }

    pub fn build(self) -> Vec<u8> {
        let mut data = Vec::with_capacity(SNOOP_FILE_HEADER_LEN + self.records.len());
        data.extend_from_slice(b"snoop\0\0\0");
        data.extend_from_slice(&2u32.to_be_bytes()); // Version
        data.extend_from_slice(&4u32.to_be_bytes()); // Datalink: Ethernet
        data.extend_from_slice(&self.records);
        data
    }
}

/// A UDP/RTP datagram wrapped in one unfragmented IPv4 packet.
pub fn rtp_over_ipv4(
    src_ip: [u8; 4],
    dst_ip: [u8; 4],
    src_port: u16,
    dst_port: u16,
    rtp: Vec<u8>,
) -> Vec<u8> {
    let udp = UdpBuilder::new()
        .src_port(src_port)
        .dst_port(dst_port)
        .payload(rtp)
        .build();
    Ipv4Builder::new()
        .src_ip(src_ip)
        .dst_ip(dst_ip)
        .payload(udp)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_offsets() {
        let fragments = fragment_ipv4(Ipv4Builder::new(), &[0u8; 100], 40);
        assert_eq!(fragments.len(), 3);
        // Offsets 0, 5, 10 in 8-byte units; MF on all but the last
        assert_eq!(&fragments[0][6..8], &[0x20, 0x00]);
        assert_eq!(&fragments[1][6..8], &[0x20, 0x05]);
        assert_eq!(&fragments[2][6..8], &[0x00, 0x0a]);
        assert_eq!(fragments[2].len(), 20 + 20);
    }

    #[test]
    fn test_snoop_records_are_aligned() {
        let capture = SnoopCaptureBuilder::new().frame(1, 2, 0x0806, &[0u8; 3]).build();
        let record_len = u32::from_be_bytes([capture[24], capture[25], capture[26], capture[27]]);
        assert_eq!(record_len % 4, 0);
        assert_eq!(capture.len(), SNOOP_FILE_HEADER_LEN + record_len as usize);
    }
}
