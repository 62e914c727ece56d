use std::net::Ipv4Addr;

use crate::protocol::{Ipv4Packet, UdpHeader};

/// Which side of the flow the target address and port identify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Match destination address and destination port.
    #[default]
    To,
    /// Match source address and source port.
    From,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::To => "to",
            Direction::From => "from",
        }
    }
}

/// The one flow a run of the analyzer follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTarget {
    pub address: Ipv4Addr,
    pub port: u16,
    pub direction: Direction,
}

impl FlowTarget {
    pub fn new(address: Ipv4Addr, port: u16, direction: Direction) -> Self {
        Self {
            address,
            port,
            direction,
        }
    }

    /// Address on the side selected by the direction.
    pub fn address_of(&self, ip: &Ipv4Packet<'_>) -> Ipv4Addr {
        match self.direction {
            Direction::To => ip.destination,
            Direction::From => ip.source,
        }
    }

    /// Port on the side selected by the direction.
    pub fn port_of(&self, udp: &UdpHeader) -> u16 {
        match self.direction {
            Direction::To => udp.dst_port,
            Direction::From => udp.src_port,
        }
    }

    pub fn matches_address(&self, ip: &Ipv4Packet<'_>) -> bool {
        self.address_of(ip) == self.address
    }

    pub fn matches_port(&self, udp: &UdpHeader) -> bool {
        self.port_of(udp) == self.port
    }
}
