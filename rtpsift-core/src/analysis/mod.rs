//! RTP stream analysis.
//!
//! - [`classify`] - payload-type framing table and silence detection
//! - [`DeltaHistogram`] - inter-packet delay histogram
//! - [`SequenceTracker`] - sequence, timestamp and timing checks
//! - [`AnalysisReport`] - end-of-run summary

pub mod classify;
mod histogram;
mod report;
mod validator;

pub use classify::{
    encoding_for, expected_frame_length, is_silence, payload_profile, scan_silence,
    silence_sentinel, AudioEncoding, NonSilence, PayloadProfile, SilenceScan,
};
pub use histogram::{DeltaHistogram, HISTOGRAM_BUCKETS};
pub use report::{AnalysisReport, AnomalyEvent};
pub use validator::{
    micros_to_ms, PacketClock, SequenceTracker, ValidationReport, FIRST_PACKET_DELTA_MS,
};
