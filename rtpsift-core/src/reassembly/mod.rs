//! Flow filtering and IP fragment reassembly.
//!
//! Capture records are filtered down to the UDP datagrams of a single
//! [`FlowTarget`] and fragmented datagrams are stitched back together by the
//! single-slot [`FragmentReassembler`].

mod filter;
mod reassembler;

pub use filter::{Direction, FlowTarget};
pub use reassembler::{
    Datagram, FragmentReassembler, ReassemblyOutcome, ReassemblyStats, SkipReason,
    DEFAULT_MAX_DATAGRAM_LEN,
};
