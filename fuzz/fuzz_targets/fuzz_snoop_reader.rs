//! Fuzz target for snoop capture walking.
//!
//! Tests handling of malformed captures including:
//! - Magic prefix detection
//! - Record descriptors with zero, undersized or oversized lengths
//! - Frames shorter than the link header

#![no_main]

use libfuzzer_sys::fuzz_target;
use rtpsift_core::capture::{classify, CaptureFormat, SnoopRecords};

fuzz_target!(|data: &[u8]| {
    // Format detection should never panic
    if let Ok(CaptureFormat::RawCapture) = classify(data) {
        let mut records = SnoopRecords::new(data);
        for record in records.by_ref() {
            let _ = record.next_header();
            let _ = record.network_payload();
        }
        let _ = records.stop_reason();
    }
});
