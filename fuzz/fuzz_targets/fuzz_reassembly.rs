//! Fuzz target for IP fragment reassembly.
//!
//! The input is cut into IPv4 packets and wrapped in a snoop capture, so the
//! reassembler sees arbitrary headers, offsets and lengths for one flow.

#![no_main]

use std::net::Ipv4Addr;

use libfuzzer_sys::fuzz_target;
use rtpsift_core::capture::SnoopRecords;
use rtpsift_core::reassembly::{Direction, FlowTarget, FragmentReassembler, ReassemblyOutcome};
use rtpsift_core::test_utils::SnoopCaptureBuilder;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First byte picks the packet size, the rest is packet bytes
    let chunk = data[0] as usize + 20;
    let capture = data[1..]
        .chunks(chunk)
        .enumerate()
        .fold(SnoopCaptureBuilder::new(), |b, (i, packet)| {
            b.ipv4(0, i as u32, packet)
        })
        .build();

    let target = FlowTarget::new(Ipv4Addr::new(192, 168, 1, 2), 5004, Direction::To);
    let mut reassembler = FragmentReassembler::new(target).with_max_datagram_len(4096);

    for record in SnoopRecords::new(&capture) {
        if let ReassemblyOutcome::Complete(datagram) = reassembler.push(&record) {
            assert!(datagram.data.len() <= 4096);
        }
    }
});
