//! Protocol headers carried in a capture.
//!
//! - [`Ipv4Packet`] - IPv4 header fields needed for fragment reassembly
//! - [`UdpHeader`] - UDP ports and declared length
//! - [`RtpHeader`] / [`RtpPacket`] - fixed RTP header and its payload
//!
//! IPv4 and UDP decoding is delegated to `etherparse`; RTP is decoded by hand
//! because only the fixed header is needed.

mod ipv4;
mod rtp;
mod udp;

pub use ipv4::{ethertype, Ipv4Packet, IP_PROTO_UDP};
pub use rtp::{
    RtpHeader, RtpPacket, COMFORT_NOISE_PAYLOAD, MARKER_BIT, RTP_HEADER_LEN, RTP_VERSION_BYTE,
};
pub use udp::{UdpHeader, UDP_HEADER_LEN};
