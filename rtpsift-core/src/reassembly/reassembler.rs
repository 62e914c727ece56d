use std::net::Ipv4Addr;

use bytes::Bytes;
use tracing::{debug, warn};

use super::filter::FlowTarget;
use crate::capture::{CaptureRecord, CaptureTimestamp};
use crate::error::FragmentMismatch;
use crate::protocol::{ethertype, Ipv4Packet, UdpHeader, IP_PROTO_UDP, RTP_HEADER_LEN, UDP_HEADER_LEN};

/// Largest datagram the reassembler will buffer by default.
pub const DEFAULT_MAX_DATAGRAM_LEN: usize = 65_535;

/// A UDP datagram of the target flow, reassembled when it was fragmented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Index of the record that completed the datagram.
    pub record_index: u64,
    /// Capture time of the completing record.
    pub timestamp: CaptureTimestamp,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub udp: UdpHeader,
    /// Number of IP packets the datagram arrived in.
    pub fragments: usize,
    /// UDP data: starts with the RTP header.
    pub data: Bytes,
}

/// Why a record produced nothing without disturbing the reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Link-layer next header is not IPv4
    NotIpv4,
    /// IPv4 or UDP header could not be decoded
    Malformed,
    /// IP protocol is not UDP
    NotUdp,
    /// Address on the targeted side is not the target address
    WrongAddress,
    /// Completed datagram is for another port
    WrongPort,
    /// Completed datagram does not carry the configured payload length
    UnexpectedLength,
}

/// Result of feeding one record to the reassembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReassemblyOutcome {
    /// A whole datagram of the target flow.
    Complete(Datagram),
    /// Fragment accepted, more to come.
    Pending,
    /// Record ignored.
    Skipped(SkipReason),
    /// In-flight reassembly dropped.
    Abandoned(FragmentMismatch),
}

/// Counters kept across a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReassemblyStats {
    pub records: u64,
    pub fragments: u64,
    pub datagrams: u64,
    pub abandoned: u64,
    pub not_ipv4: u64,
    pub malformed: u64,
    pub not_udp: u64,
    pub wrong_address: u64,
    pub wrong_port: u64,
    pub unexpected_length: u64,
}

impl ReassemblyStats {
    fn count_skip(&mut self, reason: SkipReason) {
        let counter = match reason {
            SkipReason::NotIpv4 => &mut self.not_ipv4,
            SkipReason::Malformed => &mut self.malformed,
            SkipReason::NotUdp => &mut self.not_udp,
            SkipReason::WrongAddress => &mut self.wrong_address,
            SkipReason::WrongPort => &mut self.wrong_port,
            SkipReason::UnexpectedLength => &mut self.unexpected_length,
        };
        *counter += 1;
    }
}

/// The single in-flight reassembly.
#[derive(Debug)]
struct ReassemblyState {
    identification: u16,
    /// Offset (8-byte units) the next fragment must carry.
    next_offset: u16,
    source: Ipv4Addr,
    destination: Ipv4Addr,
    udp: UdpHeader,
    /// UDP data length declared by the first fragment.
    declared_len: usize,
    /// UDP data (RTP header onward) received so far.
    buffer: Vec<u8>,
    fragments: usize,
}

/// Reassembles fragmented UDP datagrams of one filtered flow.
///
/// At most one datagram is in flight. Fragments must arrive in order; any
/// fragment whose offset or identification does not continue the in-flight
/// datagram drops it. Nothing is buffered out of order, so memory stays
/// bounded by one datagram, and interleaved fragmented flows to the same
/// address cannot be recovered.
pub struct FragmentReassembler {
    target: FlowTarget,
    expected_payload_len: Option<usize>,
    max_datagram_len: usize,
    state: Option<ReassemblyState>,
    stats: ReassemblyStats,
}

impl FragmentReassembler {
    pub fn new(target: FlowTarget) -> Self {
        Self {
            target,
            expected_payload_len: None,
            max_datagram_len: DEFAULT_MAX_DATAGRAM_LEN,
            state: None,
            stats: ReassemblyStats::default(),
        }
    }

    /// Only emit datagrams whose RTP payload (after the fixed header) has this length.
    pub fn with_expected_payload_len(mut self, len: Option<usize>) -> Self {
        self.expected_payload_len = len;
        self
    }

    /// Reject datagrams larger than `len` bytes of UDP data.
    pub fn with_max_datagram_len(mut self, len: usize) -> Self {
        self.max_datagram_len = len;
        self
    }

    pub fn target(&self) -> &FlowTarget {
        &self.target
    }

    pub fn stats(&self) -> &ReassemblyStats {
        &self.stats
    }

    /// Offset (8-byte units) the next accepted fragment must carry.
    pub fn expected_offset(&self) -> u16 {
        self.state.as_ref().map_or(0, |s| s.next_offset)
    }

    /// Whether a fragmented datagram is partially assembled.
    pub fn in_flight(&self) -> bool {
        self.state.is_some()
    }

    /// Feed one capture record.
    pub fn push(&mut self, record: &CaptureRecord<'_>) -> ReassemblyOutcome {
        self.stats.records += 1;

        if record.next_header() != Some(ethertype::IPV4) {
            debug!(record = record.index, "skipping non-ip record");
            return self.skip(SkipReason::NotIpv4);
        }

        let ip = match Ipv4Packet::parse(record.network_payload()) {
            Ok(ip) => ip,
            Err(e) => {
                debug!(record = record.index, "skipping malformed ip packet: {e}");
                return self.skip(SkipReason::Malformed);
            }
        };

        if ip.protocol != IP_PROTO_UDP {
            debug!(record = record.index, protocol = ip.protocol, "skipping non-udp packet");
            return self.skip(SkipReason::NotUdp);
        }

        if !self.target.matches_address(&ip) {
            debug!(
                record = record.index,
                "skipping, wrong ip {} != {}",
                self.target.address_of(&ip),
                self.target.address
            );
            return self.skip(SkipReason::WrongAddress);
        }

        if ip.is_fragment() {
            self.stats.fragments += 1;
        }

        let expected = self.expected_offset();
        if ip.fragment_offset != expected {
            debug!(
                record = record.index,
                "skipping, expected offset {expected}, got {}", ip.fragment_offset
            );
            return self.abandon(FragmentMismatch::UnexpectedOffset {
                expected,
                actual: ip.fragment_offset,
            });
        }

        let accepted = if ip.fragment_offset == 0 {
            self.begin(record, &ip)
        } else {
            self.continue_with(record, &ip)
        };
        if let Err(outcome) = accepted {
            return outcome;
        }

        if ip.more_fragments {
            if let Some(state) = self.state.as_mut() {
                state.next_offset += (ip.payload.len() / 8) as u16;
            }
            return ReassemblyOutcome::Pending;
        }

        match self.state.take() {
            Some(state) => self.finish(record, state),
            None => ReassemblyOutcome::Pending,
        }
    }

    /// Start a datagram from its first (or only) fragment.
    fn begin(
        &mut self,
        record: &CaptureRecord<'_>,
        ip: &Ipv4Packet<'_>,
    ) -> Result<(), ReassemblyOutcome> {
        let udp = match UdpHeader::parse(ip.payload) {
            Ok(udp) => udp,
            Err(e) => {
                debug!(record = record.index, "skipping malformed udp header: {e}");
                return Err(self.skip(SkipReason::Malformed));
            }
        };

        let declared_len = match udp.data_len() {
            Ok(len) if len >= RTP_HEADER_LEN => len,
            Ok(len) => {
                debug!(record = record.index, "skipping, {len} bytes of udp data cannot hold rtp");
                return Err(self.skip(SkipReason::Malformed));
            }
            Err(e) => {
                debug!(record = record.index, "skipping malformed udp header: {e}");
                return Err(self.skip(SkipReason::Malformed));
            }
        };

        if declared_len > self.max_datagram_len {
            return Err(self.abandon(FragmentMismatch::Oversized {
                length: declared_len,
                limit: self.max_datagram_len,
            }));
        }

        // Only what this fragment carries; the rest arrives in continuations.
        let mut buffer = Vec::with_capacity(declared_len);
        buffer.extend_from_slice(&ip.payload[UDP_HEADER_LEN..]);

        self.state = Some(ReassemblyState {
            identification: ip.identification,
            next_offset: 0,
            source: ip.source,
            destination: ip.destination,
            udp,
            declared_len,
            buffer,
            fragments: 1,
        });
        Ok(())
    }

    /// Append a continuation fragment to the in-flight datagram.
    fn continue_with(
        &mut self,
        record: &CaptureRecord<'_>,
        ip: &Ipv4Packet<'_>,
    ) -> Result<(), ReassemblyOutcome> {
        let Some(state) = self.state.as_mut() else {
            return Err(self.abandon(FragmentMismatch::UnexpectedOffset {
                expected: 0,
                actual: ip.fragment_offset,
            }));
        };

        if ip.identification != state.identification {
            debug!(
                record = record.index,
                "skipping, id's don't match {} != {}", ip.identification, state.identification
            );
            let expected = state.identification;
            return Err(self.abandon(FragmentMismatch::IdentificationMismatch {
                expected,
                actual: ip.identification,
            }));
        }

        // Continuations carry no UDP header; their bytes land where the UDP
        // data would be if the first fragment's header were not counted.
        let position = ip.fragment_offset as usize * 8 - UDP_HEADER_LEN;
        let end = position + ip.payload.len();
        if end > self.max_datagram_len {
            return Err(self.abandon(FragmentMismatch::Oversized {
                length: end,
                limit: self.max_datagram_len,
            }));
        }

        state.buffer.resize(position, 0);
        state.buffer.extend_from_slice(ip.payload);
        state.fragments += 1;
        Ok(())
    }

    fn finish(&mut self, record: &CaptureRecord<'_>, mut state: ReassemblyState) -> ReassemblyOutcome {
        if !self.target.matches_port(&state.udp) {
            debug!(
                record = record.index,
                "skipping bad port {} != {}",
                self.target.port_of(&state.udp),
                self.target.port
            );
            return self.skip(SkipReason::WrongPort);
        }

        if state.buffer.len() < state.declared_len {
            return self.abandon(FragmentMismatch::LengthMismatch {
                declared: state.declared_len,
                assembled: state.buffer.len(),
            });
        }
        // Anything past the UDP length (IP padding) is not part of the datagram.
        state.buffer.truncate(state.declared_len);

        let payload_len = state.declared_len - RTP_HEADER_LEN;
        if let Some(expected) = self.expected_payload_len {
            if expected != payload_len {
                warn!(
                    record = record.index,
                    "skipping because of wrong data size {expected} != {payload_len}"
                );
                return self.skip(SkipReason::UnexpectedLength);
            }
        }

        self.stats.datagrams += 1;
        ReassemblyOutcome::Complete(Datagram {
            record_index: record.index,
            timestamp: record.timestamp,
            source: state.source,
            destination: state.destination,
            udp: state.udp,
            fragments: state.fragments,
            data: Bytes::from(state.buffer),
        })
    }

    fn skip(&mut self, reason: SkipReason) -> ReassemblyOutcome {
        self.stats.count_skip(reason);
        ReassemblyOutcome::Skipped(reason)
    }

    fn abandon(&mut self, mismatch: FragmentMismatch) -> ReassemblyOutcome {
        if self.state.take().is_some() {
            self.stats.abandoned += 1;
        }
        ReassemblyOutcome::Abandoned(mismatch)
    }
}
