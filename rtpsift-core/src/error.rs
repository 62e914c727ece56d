//! Error types for rtpsift-core.
//!
//! This module provides structured error types for all rtpsift-core operations:
//!
//! - [`enum@Error`] - Main error enum that wraps all fatal error types
//! - [`CaptureError`] - Errors from opening, mapping and classifying captures
//! - [`ProtocolError`] - Errors from header decoding
//! - [`FragmentMismatch`] - Recoverable reassembly failures (never fatal)
//! - [`ProtocolAnomaly`] - Stream diagnostics recorded in the report (never fatal)
//!
//! All errors implement `std::error::Error` and can be converted to `anyhow::Error`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for rtpsift-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error opening or interpreting the capture file
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Error decoding a protocol header
    #[error("Protocol parse error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Analyzer configuration cannot be used for this input
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// I/O error (output files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to capture input.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// File could not be opened or stat'd
    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File could not be memory mapped
    #[error("Cannot map {path}: {source}")]
    Map {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Magic prefix is neither a snoop capture nor a session recording
    #[error("Unrecognized input file (prefix {prefix:?})")]
    UnrecognizedFormat { prefix: String },

    /// A record header that cannot be trusted to advance the cursor.
    ///
    /// Cursors stop at such a record and keep it as their stop reason.
    #[error("Malformed record {index} at offset {offset}: {reason}")]
    MalformedRecord {
        index: u64,
        offset: usize,
        reason: String,
    },
}

/// Errors related to header decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Packet too short for protocol header
    #[error("{protocol}: packet too short (need {needed} bytes, have {have})")]
    PacketTooShort {
        protocol: &'static str,
        needed: usize,
        have: usize,
    },

    /// Invalid header field value
    #[error("{protocol}: invalid {field}: {reason}")]
    InvalidField {
        protocol: &'static str,
        field: &'static str,
        reason: String,
    },
}

/// Why an in-flight IP reassembly was abandoned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FragmentMismatch {
    /// Fragment offset (8-byte units) is not the one the reassembler expects
    #[error("expected fragment offset {expected}, got {actual}")]
    UnexpectedOffset { expected: u16, actual: u16 },

    /// Continuation fragment belongs to another datagram
    #[error("fragment id {actual:#06x} does not match datagram {expected:#06x}")]
    IdentificationMismatch { expected: u16, actual: u16 },

    /// Final fragment did not fill the length declared by the UDP header
    #[error("reassembled {assembled} bytes, UDP header declared {declared}")]
    LengthMismatch { declared: usize, assembled: usize },

    /// Declared or assembled length exceeds the configured bound
    #[error("datagram of {length} bytes exceeds limit of {limit}")]
    Oversized { length: usize, limit: usize },
}

/// A diagnostic event observed while validating an RTP stream.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolAnomaly {
    /// Version/flags byte is not 0x80
    #[error("bad version byte {found:#04x}")]
    BadVersion { found: u8 },

    /// Sequence number is not the successor of the previous packet
    #[error("out of sequence packet, expected {expected:#06x}, got {received:#06x}, off by {}", seq_offset(.expected, .received))]
    SequenceMismatch { expected: u16, received: u16 },

    /// RTP timestamp did not advance by the previous payload length
    #[error("bad rtp timestamp, expected {expected:#x}, got {received:#x}, off by {}", ts_offset(.expected, .received))]
    TimestampMismatch { expected: u32, received: u32 },

    /// Capture timestamps went backwards
    #[error("negative time change {delta_ms} ms")]
    NegativeDelta { delta_ms: i64 },

    /// Payload length differs from the frame length of its payload type
    #[error("unusual data length {actual} for payload type {payload_type} (expected {expected})")]
    UnusualLength {
        payload_type: u8,
        expected: usize,
        actual: usize,
    },
}

impl ProtocolAnomaly {
    /// Short stable name used for per-kind counters.
    pub fn kind(&self) -> AnomalyKind {
        match self {
            ProtocolAnomaly::BadVersion { .. } => AnomalyKind::BadVersion,
            ProtocolAnomaly::SequenceMismatch { .. } => AnomalyKind::SequenceMismatch,
            ProtocolAnomaly::TimestampMismatch { .. } => AnomalyKind::TimestampMismatch,
            ProtocolAnomaly::NegativeDelta { .. } => AnomalyKind::NegativeDelta,
            ProtocolAnomaly::UnusualLength { .. } => AnomalyKind::UnusualLength,
        }
    }
}

/// Discriminant of [`ProtocolAnomaly`], used as a counter index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnomalyKind {
    BadVersion,
    SequenceMismatch,
    TimestampMismatch,
    NegativeDelta,
    UnusualLength,
}

impl AnomalyKind {
    pub const ALL: [AnomalyKind; 5] = [
        AnomalyKind::BadVersion,
        AnomalyKind::SequenceMismatch,
        AnomalyKind::TimestampMismatch,
        AnomalyKind::NegativeDelta,
        AnomalyKind::UnusualLength,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::BadVersion => "bad_version",
            AnomalyKind::SequenceMismatch => "sequence_mismatch",
            AnomalyKind::TimestampMismatch => "timestamp_mismatch",
            AnomalyKind::NegativeDelta => "negative_delta",
            AnomalyKind::UnusualLength => "unusual_length",
        }
    }
}

fn seq_offset(expected: &u16, received: &u16) -> i16 {
    received.wrapping_sub(*expected) as i16
}

fn ts_offset(expected: &u32, received: &u32) -> i32 {
    received.wrapping_sub(*expected) as i32
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_anomaly_reports_signed_offset() {
        let anomaly = ProtocolAnomaly::SequenceMismatch {
            expected: 0xfffe,
            received: 0x0001,
        };
        let text = anomaly.to_string();
        assert!(text.contains("off by 3"), "{text}");
    }

    #[test]
    fn test_capture_error_wraps_into_error() {
        let err: Error = CaptureError::UnrecognizedFormat {
            prefix: "GIF89".into(),
        }
        .into();
        assert!(matches!(err, Error::Capture(_)));
        assert!(err.to_string().contains("GIF89"));
    }

    #[test]
    fn test_anomaly_kind_mapping() {
        let anomaly = ProtocolAnomaly::BadVersion { found: 0x40 };
        assert_eq!(anomaly.kind(), AnomalyKind::BadVersion);
        assert_eq!(AnomalyKind::ALL.len(), 5);
    }
}
