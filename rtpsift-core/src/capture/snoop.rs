//! Snoop capture cursor.
//!
//! File layout (all integers big-endian):
//!
//! ```text
//! file header   16 bytes   "snoop\0\0\0", version u32, datalink u32
//! record        repeated
//!   original_len     u32
//!   included_len     u32   bytes of frame data present
//!   record_len       u32   header + data + padding, authoritative for advance
//!   cumulative_drops u32
//!   ts_secs          u32
//!   ts_micros        u32
//!   frame            included_len bytes (Ethernet: 12 address bytes,
//!                    u16 next header, network payload)
//! ```

use tracing::warn;

use super::CaptureTimestamp;
use crate::error::CaptureError;

/// Magic prefix of a snoop capture.
pub const SNOOP_MAGIC: &[u8] = b"snoop";

/// Size of the snoop file header.
pub const SNOOP_FILE_HEADER_LEN: usize = 16;

/// Size of the per-record descriptor preceding each frame.
pub const SNOOP_RECORD_HEADER_LEN: usize = 24;

/// Link-layer addresses plus next-header field.
const LINK_HEADER_LEN: usize = 14;

/// One link-layer frame borrowed from the mapped capture.
#[derive(Debug, Clone, Copy)]
pub struct CaptureRecord<'a> {
    /// 1-based position of the record in the capture.
    pub index: u64,
    /// Byte offset of the record descriptor.
    pub offset: usize,
    pub timestamp: CaptureTimestamp,
    /// Length of the frame on the wire.
    pub original_len: u32,
    /// Link-layer frame, limited to the captured bytes.
    pub frame: &'a [u8],
}

impl<'a> CaptureRecord<'a> {
    /// Next-header indicator of the link-layer frame.
    pub fn next_header(&self) -> Option<u16> {
        if self.frame.len() < LINK_HEADER_LEN {
            return None;
        }
        Some(u16::from_be_bytes([self.frame[12], self.frame[13]]))
    }

    /// Bytes following the link-layer header.
    pub fn network_payload(&self) -> &'a [u8] {
        self.frame.get(LINK_HEADER_LEN..).unwrap_or(&[])
    }
}

/// Forward-only cursor over the records of a snoop capture.
///
/// Iteration ends at the end of the buffer or at the first record whose
/// descriptor is unusable (zero or undersized record length, or a frame
/// running past the end of the buffer). In the latter case the reason is
/// available from [`SnoopRecords::stop_reason`].
pub struct SnoopRecords<'a> {
    data: &'a [u8],
    offset: usize,
    index: u64,
    stop: Option<CaptureError>,
}

impl<'a> SnoopRecords<'a> {
    /// Create a cursor over a whole capture, file header included.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: SNOOP_FILE_HEADER_LEN.min(data.len()),
            index: 0,
            stop: None,
        }
    }

    /// Why iteration ended before the end of the buffer, if it did.
    pub fn stop_reason(&self) -> Option<&CaptureError> {
        self.stop.as_ref()
    }

    pub fn take_stop_reason(&mut self) -> Option<CaptureError> {
        self.stop.take()
    }

    /// Number of records yielded so far.
    pub fn records_read(&self) -> u64 {
        self.index
    }

    fn halt(&mut self, reason: &str) -> Option<CaptureRecord<'a>> {
        let err = CaptureError::MalformedRecord {
            index: self.index + 1,
            offset: self.offset,
            reason: reason.to_string(),
        };
        warn!("{err}, stopping before end of capture");
        self.stop = Some(err);
        self.offset = self.data.len();
        None
    }
}

fn be_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

impl<'a> Iterator for SnoopRecords<'a> {
    type Item = CaptureRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }

        let rest = &self.data[self.offset..];
        if rest.len() < SNOOP_RECORD_HEADER_LEN {
            return self.halt("truncated record descriptor");
        }

        let original_len = be_u32(rest, 0);
        let included_len = be_u32(rest, 4) as usize;
        let record_len = be_u32(rest, 8) as usize;
        let timestamp = CaptureTimestamp::new(be_u32(rest, 16), be_u32(rest, 20));

        if record_len == 0 {
            return self.halt("zero record length");
        }
        if record_len < SNOOP_RECORD_HEADER_LEN + included_len {
            return self.halt("record length smaller than its contents");
        }
        let frame_end = SNOOP_RECORD_HEADER_LEN + included_len;
        if frame_end > rest.len() {
            return self.halt("frame runs past end of capture");
        }

        self.index += 1;
        let record = CaptureRecord {
            index: self.index,
            offset: self.offset,
            timestamp,
            original_len,
            frame: &rest[SNOOP_RECORD_HEADER_LEN..frame_end],
        };

        // Round up to a 4-byte boundary
        let advance = (record_len + 3) & !3;
        self.offset = self.offset.saturating_add(advance);

        Some(record)
    }
}
