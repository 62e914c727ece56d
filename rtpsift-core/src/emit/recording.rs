use std::io::{self, Write};

use crate::capture::{recording_file_header, RecordingFrame};
use crate::protocol::RtpPacket;

/// Writes a session recording readable by [`crate::capture::RecordingFrames`].
pub struct RecordingWriter<W: Write> {
    inner: W,
    frames: u64,
    bytes: u64,
}

impl<W: Write> RecordingWriter<W> {
    /// Write the file header.
    pub fn new(mut inner: W) -> io::Result<Self> {
        let header = recording_file_header();
        inner.write_all(&header)?;
        Ok(Self {
            inner,
            frames: 0,
            bytes: header.len() as u64,
        })
    }

    pub fn write_frame(&mut self, frame: &RecordingFrame) -> io::Result<()> {
        let written = frame.write_to(&mut self.inner)?;
        self.frames += 1;
        self.bytes += written as u64;
        Ok(())
    }

    /// Write a packet with its delta, saturating the delta into 0..=65535.
    pub fn write_packet(&mut self, delta_ms: i64, packet: &RtpPacket) -> io::Result<()> {
        let delta = delta_ms.clamp(0, u16::MAX as i64) as u16;
        self.write_frame(&RecordingFrame::new(delta, packet.clone()))
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Bytes written, file header included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::capture::{RecordingFrames, RECORDING_FILE_HEADER_LEN};
    use crate::test_utils::RtpBuilder;

    fn packet(seq: u16, ts: u32, pt: u8, payload: Vec<u8>) -> RtpPacket {
        let rtp = RtpBuilder::new()
            .sequence(seq)
            .timestamp(ts)
            .payload_type(pt)
            .payload(payload)
            .build();
        RtpPacket::parse(Bytes::from(rtp)).unwrap()
    }

    #[test]
    fn test_written_session_reads_back() {
        let packets = vec![
            (20, packet(10, 0, 0, vec![0xff; 160])),
            (21, packet(11, 160, 0, vec![0x7f; 160])),
            (0, packet(12, 320, 13, vec![0x40])),
            (19, packet(13, 321, 104, vec![0x00; 1280])),
        ];

        let mut writer = RecordingWriter::new(Vec::new()).unwrap();
        for (delta, p) in &packets {
            writer.write_packet(*delta, p).unwrap();
        }
        assert_eq!(writer.frames_written(), 4);
        let expected_len = RECORDING_FILE_HEADER_LEN as u64 + 4 * 16 + 160 + 160 + 1 + 1280;
        assert_eq!(writer.bytes_written(), expected_len);
        let data = writer.finish().unwrap();

        let read: Vec<_> = RecordingFrames::new(&data).collect();
        assert_eq!(read.len(), packets.len());
        for (frame, (delta, p)) in read.iter().zip(&packets) {
            assert_eq!(frame.delta_ms as i64, *delta);
            assert_eq!(frame.packet.header.payload_type(), p.header.payload_type());
            assert_eq!(frame.packet.header.sequence, p.header.sequence);
            assert_eq!(frame.packet.header.timestamp, p.header.timestamp);
            assert_eq!(frame.packet.payload, p.payload);
        }
    }

    #[test]
    fn test_delta_saturates() {
        let mut writer = RecordingWriter::new(Vec::new()).unwrap();
        writer.write_packet(-7, &packet(1, 0, 0, vec![])).unwrap();
        writer.write_packet(100_000, &packet(2, 0, 0, vec![])).unwrap();
        let data = writer.finish().unwrap();

        let deltas: Vec<u16> = RecordingFrames::new(&data).map(|f| f.delta_ms).collect();
        assert_eq!(deltas, vec![0, u16::MAX]);
    }
}
