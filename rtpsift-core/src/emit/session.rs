use std::fs::File;
use std::io::{self, BufWriter, Seek, Stdout, Write};

use super::au::AuWriter;
use super::recording::RecordingWriter;
use super::time_points::TimePointWriter;
use crate::protocol::RtpPacket;

/// Totals of what the emitter wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitterStats {
    pub audio_bytes: u64,
    pub audio_frames: u64,
    /// Comfort-noise frames left out of the audio.
    pub comfort_frames_skipped: u64,
    pub recording_frames: u64,
    pub time_points: u64,
}

/// The writers handed back by [`SessionEmitter::finish`].
pub struct EmitterOutputs<A, R, T> {
    pub audio: Option<A>,
    pub recording: Option<R>,
    pub time_points: Option<T>,
    pub stats: EmitterStats,
}

/// Optional outputs fed with every processed packet.
///
/// Each output is independent; an emitter with none of them is a no-op.
pub struct SessionEmitter<A = BufWriter<File>, R = BufWriter<File>, T = Stdout>
where
    A: Write + Seek,
    R: Write,
    T: Write,
{
    audio: Option<AuWriter<A>>,
    recording: Option<RecordingWriter<R>>,
    time_points: Option<TimePointWriter<T>>,
    stats: EmitterStats,
}

impl<A: Write + Seek, R: Write, T: Write> Default for SessionEmitter<A, R, T> {
    fn default() -> Self {
        Self {
            audio: None,
            recording: None,
            time_points: None,
            stats: EmitterStats::default(),
        }
    }
}

impl<A: Write + Seek, R: Write, T: Write> SessionEmitter<A, R, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_audio(mut self, writer: AuWriter<A>) -> Self {
        self.audio = Some(writer);
        self
    }

    pub fn with_recording(mut self, writer: RecordingWriter<R>) -> Self {
        self.recording = Some(writer);
        self
    }

    pub fn with_time_points(mut self, writer: TimePointWriter<T>) -> Self {
        self.time_points = Some(writer);
        self
    }

    pub fn stats(&self) -> &EmitterStats {
        &self.stats
    }

    /// Append the payload to the audio track. Comfort noise is not audio and is skipped.
    pub fn write_audio(&mut self, packet: &RtpPacket) -> io::Result<()> {
        let Some(audio) = self.audio.as_mut() else {
            return Ok(());
        };
        if packet.header.is_comfort_noise() {
            self.stats.comfort_frames_skipped += 1;
            return Ok(());
        }
        audio.write_samples(&packet.payload)?;
        self.stats.audio_bytes += packet.payload_len() as u64;
        self.stats.audio_frames += 1;
        Ok(())
    }

    pub fn write_recording(&mut self, delta_ms: i64, packet: &RtpPacket) -> io::Result<()> {
        if let Some(recording) = self.recording.as_mut() {
            recording.write_packet(delta_ms, packet)?;
            self.stats.recording_frames += 1;
        }
        Ok(())
    }

    pub fn write_time_point(&mut self, packet_index: u64, marker: bool, delta_ms: i64) -> io::Result<()> {
        if let Some(points) = self.time_points.as_mut() {
            points.write_point(packet_index, marker, delta_ms)?;
            self.stats.time_points += 1;
        }
        Ok(())
    }

    /// Close every output, patching the audio header.
    pub fn finish(self) -> io::Result<EmitterOutputs<A, R, T>> {
        Ok(EmitterOutputs {
            audio: self.audio.map(AuWriter::finish).transpose()?,
            recording: self.recording.map(RecordingWriter::finish).transpose()?,
            time_points: self.time_points.map(TimePointWriter::finish).transpose()?,
            stats: self.stats,
        })
    }
}
