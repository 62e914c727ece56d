//! Capture formats and record cursors.
//!
//! Two input formats are recognized by their magic prefix:
//!
//! - [`CaptureFormat::RawCapture`] - a snoop link-layer capture (`"snoop"`),
//!   walked with [`SnoopRecords`]
//! - [`CaptureFormat::RecordedSession`] - a bridge session recording
//!   (`"RTP"`), walked with [`RecordingFrames`]
//!
//! Both cursors are forward-only and stop at the first record whose header
//! cannot be trusted, keeping a [`CaptureError::MalformedRecord`] as the
//! stop reason instead of failing the run.

pub mod recording;
pub mod snoop;

pub use recording::{
    recording_file_header, RecordingFrame, RecordingFrames, RECORDING_FILE_HEADER_LEN,
    RECORDING_FRAME_HEADER_LEN, RECORDING_MAGIC,
};
pub use snoop::{
    CaptureRecord, SnoopRecords, SNOOP_FILE_HEADER_LEN, SNOOP_MAGIC, SNOOP_RECORD_HEADER_LEN,
};

use crate::error::CaptureError;

/// Kind of input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    /// Raw link-layer capture (snoop)
    RawCapture,
    /// Pre-recorded RTP session
    RecordedSession,
}

impl CaptureFormat {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureFormat::RawCapture => "snoop",
            CaptureFormat::RecordedSession => "recording",
        }
    }
}

/// Classify a capture by its magic prefix.
pub fn classify(data: &[u8]) -> Result<CaptureFormat, CaptureError> {
    if data.starts_with(SNOOP_MAGIC) {
        Ok(CaptureFormat::RawCapture)
    } else if data.starts_with(RECORDING_MAGIC) {
        Ok(CaptureFormat::RecordedSession)
    } else {
        let prefix = &data[..data.len().min(8)];
        Err(CaptureError::UnrecognizedFormat {
            prefix: String::from_utf8_lossy(prefix).into_owned(),
        })
    }
}

/// Capture time of a record, as stored by snoop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct CaptureTimestamp {
    pub secs: u32,
    pub micros: u32,
}

impl CaptureTimestamp {
    pub fn new(secs: u32, micros: u32) -> Self {
        Self { secs, micros }
    }

    /// Signed microseconds from `earlier` to `self`.
    pub fn micros_since(&self, earlier: &CaptureTimestamp) -> i64 {
        (self.secs as i64 - earlier.secs as i64) * 1_000_000
            + (self.micros as i64 - earlier.micros as i64)
    }
}
