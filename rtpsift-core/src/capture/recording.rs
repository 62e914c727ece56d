//! Recorded-session format.
//!
//! Used both as analyzer input (conference recordings) and as output
//! (re-serialized sessions). All integers are big-endian.
//!
//! ```text
//! file header   16 bytes   "RTP" followed by zeros
//! frame         repeated
//!   length      u16   whole frame, counted from its own first byte
//!   delta_ms    u16   time since the previous frame
//!   rtp header  12 bytes
//!   payload     length - 16 bytes
//! ```

use std::io::Write;

use bytes::Bytes;
use tracing::warn;

use crate::error::{CaptureError, ProtocolError};
use crate::protocol::{RtpHeader, RtpPacket, RTP_HEADER_LEN};

/// Magic prefix of a session recording.
pub const RECORDING_MAGIC: &[u8] = b"RTP";

/// Size of the recording file header.
pub const RECORDING_FILE_HEADER_LEN: usize = 16;

/// Length and delta fields plus the RTP header.
pub const RECORDING_FRAME_HEADER_LEN: usize = 4 + RTP_HEADER_LEN;

/// The 16-byte header every recording starts with.
pub fn recording_file_header() -> [u8; RECORDING_FILE_HEADER_LEN] {
    let mut header = [0u8; RECORDING_FILE_HEADER_LEN];
    header[..RECORDING_MAGIC.len()].copy_from_slice(RECORDING_MAGIC);
    header
}

/// One frame of a session recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingFrame {
    /// Milliseconds since the previous frame.
    pub delta_ms: u16,
    pub packet: RtpPacket,
}

impl RecordingFrame {
    pub fn new(delta_ms: u16, packet: RtpPacket) -> Self {
        Self { delta_ms, packet }
    }

    /// Size of the encoded frame, which is also the value of its length field.
    pub fn encoded_len(&self) -> usize {
        RECORDING_FRAME_HEADER_LEN + self.packet.payload_len()
    }

    /// Write the encoded frame.
    ///
    /// Fails with `InvalidInput` when the frame does not fit the 16-bit length field.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<usize> {
        let len = self.encoded_len();
        let len_field = u16::try_from(len).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("recording frame of {len} bytes exceeds 65535"),
            )
        })?;

        writer.write_all(&len_field.to_be_bytes())?;
        writer.write_all(&self.delta_ms.to_be_bytes())?;
        writer.write_all(&self.packet.header.to_bytes())?;
        writer.write_all(&self.packet.payload)?;
        Ok(len)
    }

    /// Decode a frame at the start of `data`.
    ///
    /// Returns the frame and the number of bytes it occupies.
    pub fn decode(data: &[u8]) -> Result<(Self, usize), ProtocolError> {
        if data.len() < 4 {
            return Err(ProtocolError::PacketTooShort {
                protocol: "recording",
                needed: 4,
                have: data.len(),
            });
        }

        let length = u16::from_be_bytes([data[0], data[1]]) as usize;
        let delta_ms = u16::from_be_bytes([data[2], data[3]]);

        if length < RECORDING_FRAME_HEADER_LEN {
            return Err(ProtocolError::InvalidField {
                protocol: "recording",
                field: "length",
                reason: format!("{length} is shorter than the frame header"),
            });
        }
        if length > data.len() {
            return Err(ProtocolError::PacketTooShort {
                protocol: "recording",
                needed: length,
                have: data.len(),
            });
        }

        let header = RtpHeader::parse(&data[4..RECORDING_FRAME_HEADER_LEN])?;
        let payload = Bytes::copy_from_slice(&data[RECORDING_FRAME_HEADER_LEN..length]);

        Ok((
            Self {
                delta_ms,
                packet: RtpPacket { header, payload },
            },
            length,
        ))
    }
}

/// Forward-only cursor over the frames of a session recording.
///
/// Stops at the end of the buffer or at the first frame whose length field
/// is unusable; the reason is kept in [`RecordingFrames::stop_reason`].
pub struct RecordingFrames<'a> {
    data: &'a [u8],
    offset: usize,
    index: u64,
    stop: Option<CaptureError>,
}

impl<'a> RecordingFrames<'a> {
    /// Create a cursor over a whole recording, file header included.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: RECORDING_FILE_HEADER_LEN.min(data.len()),
            index: 0,
            stop: None,
        }
    }

    pub fn stop_reason(&self) -> Option<&CaptureError> {
        self.stop.as_ref()
    }

    pub fn take_stop_reason(&mut self) -> Option<CaptureError> {
        self.stop.take()
    }

    /// Number of frames yielded so far.
    pub fn frames_read(&self) -> u64 {
        self.index
    }
}

impl<'a> Iterator for RecordingFrames<'a> {
    type Item = RecordingFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }

        match RecordingFrame::decode(&self.data[self.offset..]) {
            Ok((frame, consumed)) => {
                self.index += 1;
                self.offset += consumed;
                Some(frame)
            }
            Err(e) => {
                let err = CaptureError::MalformedRecord {
                    index: self.index + 1,
                    offset: self.offset,
                    reason: e.to_string(),
                };
                warn!("{err}, stopping before end of recording");
                self.stop = Some(err);
                self.offset = self.data.len();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RtpBuilder;

    fn frame(seq: u16, ts: u32, payload: Vec<u8>) -> RecordingFrame {
        let rtp = RtpBuilder::new()
            .sequence(seq)
            .timestamp(ts)
            .payload(payload)
            .build();
        RecordingFrame::new(20, RtpPacket::parse(Bytes::from(rtp)).unwrap())
    }

    #[test]
    fn test_encode_layout() {
        let mut out = Vec::new();
        let written = frame(7, 160, vec![0xff; 4]).write_to(&mut out).unwrap();

        assert_eq!(written, 20);
        assert_eq!(&out[0..2], &[0x00, 0x14]); // Length: 20
        assert_eq!(&out[2..4], &[0x00, 0x14]); // Delta: 20 ms
        assert_eq!(out[4], 0x80); // Version byte
        assert_eq!(&out[6..8], &[0x00, 0x07]); // Sequence
        assert_eq!(&out[16..], &[0xff; 4]);
    }

    #[test]
    fn test_cursor_reads_back_frames() {
        let mut data = recording_file_header().to_vec();
        let frames = vec![frame(1, 0, vec![0x11; 160]), frame(2, 160, vec![])];
        for f in &frames {
            f.write_to(&mut data).unwrap();
        }

        let mut cursor = RecordingFrames::new(&data);
        let read: Vec<_> = cursor.by_ref().collect();
        assert_eq!(read, frames);
        assert_eq!(cursor.frames_read(), 2);
        assert!(cursor.stop_reason().is_none());
    }

    #[test]
    fn test_zero_length_frame_stops() {
        let mut data = recording_file_header().to_vec();
        frame(1, 0, vec![0; 8]).write_to(&mut data).unwrap();
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x14]); // Zero length
        frame(2, 8, vec![0; 8]).write_to(&mut data).unwrap();

        let mut cursor = RecordingFrames::new(&data);
        assert_eq!(cursor.by_ref().count(), 1);
        match cursor.take_stop_reason() {
            Some(CaptureError::MalformedRecord { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_frame_stops() {
        let mut data = recording_file_header().to_vec();
        frame(1, 0, vec![0; 160]).write_to(&mut data).unwrap();
        data.truncate(data.len() - 1);

        let mut cursor = RecordingFrames::new(&data);
        assert!(cursor.next().is_none());
        assert!(cursor.stop_reason().is_some());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let big = frame(1, 0, vec![0; 70_000]);
        let err = big.write_to(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
