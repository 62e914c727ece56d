//! # rtpsift-core
//!
//! RTP stream reconstruction and integrity checking for voice captures.
//!
//! This crate reads a raw snoop capture (or a pre-recorded session), follows
//! one UDP flow, reassembles fragmented IP datagrams, validates the RTP
//! stream they carry and optionally re-emits it as audio, a normalized
//! session recording, or a timing trace.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::net::Ipv4Addr;
//!
//! use rtpsift_core::prelude::*;
//!
//! let config = AnalyzerConfig {
//!     target: Some(FlowTarget::new(Ipv4Addr::new(10, 0, 0, 7), 5004, Direction::To)),
//!     ..AnalyzerConfig::default()
//! };
//!
//! let mut emitter: SessionEmitter = SessionEmitter::new();
//! let report = Analyzer::new(config).run("call.snoop", &mut emitter).unwrap();
//!
//! for (ms, packets) in report.histogram.rows() {
//!     println!("{ms}\t{packets}");
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        rtpsift-core                                 |
//! +---------------------------------------------------------------------+
//! |  io/         - memory-mapped capture view                           |
//! |  capture/    - format classification, snoop and recording cursors   |
//! |  protocol/   - IPv4, UDP and RTP header access                      |
//! |  reassembly/ - flow filter, single-slot IP fragment reassembler     |
//! |  analysis/   - payload classifier, histogram, sequence tracker      |
//! |  emit/       - AU, recording and time-point writers                 |
//! |  pipeline    - the single-pass analyzer                             |
//! |  error       - Error types                                          |
//! +---------------------------------------------------------------------+
//! ```

pub mod analysis;
pub mod capture;
pub mod emit;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod prelude;
pub mod protocol;
pub mod reassembly;
pub mod test_utils;

// Re-export commonly used types at crate root for convenience
pub use analysis::{
    AnalysisReport, AnomalyEvent, AudioEncoding, DeltaHistogram, PacketClock, SequenceTracker,
    ValidationReport,
};
pub use capture::{classify, CaptureFormat, CaptureRecord, CaptureTimestamp, RecordingFrame, RecordingFrames, SnoopRecords};
pub use emit::{AudioFormat, AuWriter, EmitterStats, RecordingWriter, SessionEmitter, TimePointWriter};
pub use error::{
    AnomalyKind, CaptureError, Error, FragmentMismatch, ProtocolAnomaly, ProtocolError, Result,
};
pub use io::CaptureView;
pub use pipeline::{Analyzer, AnalyzerConfig};
pub use protocol::{RtpHeader, RtpPacket};
pub use reassembly::{
    Datagram, Direction, FlowTarget, FragmentReassembler, ReassemblyOutcome, ReassemblyStats,
    SkipReason,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
