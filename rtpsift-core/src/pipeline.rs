//! The single-pass analyzer.
//!
//! ```text
//! snoop capture  --> SnoopRecords --> FragmentReassembler --+
//!                                                           +--> SequenceTracker --> SessionEmitter
//! recording      --> RecordingFrames -----------------------+
//! ```
//!
//! One [`AnalysisContext`] carries all mutable run state, so independent
//! runs never share anything.

use std::fmt::Write as _;
use std::io::{Seek, Write};
use std::path::Path;

use tracing::{debug, info, trace};

use crate::analysis::{scan_silence, AnalysisReport, PacketClock, SequenceTracker, SilenceScan, ValidationReport};
use crate::capture::{classify, CaptureFormat, RecordingFrames, SnoopRecords};
use crate::emit::SessionEmitter;
use crate::error::{Error, Result};
use crate::io::CaptureView;
use crate::protocol::RtpPacket;
use crate::reassembly::{FlowTarget, FragmentReassembler, ReassemblyOutcome, DEFAULT_MAX_DATAGRAM_LEN};

/// Configuration for the [`Analyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Flow to follow in raw captures. Required for them, ignored for recordings.
    pub target: Option<FlowTarget>,
    /// Only accept datagrams whose RTP payload has exactly this length.
    pub expected_payload_len: Option<usize>,
    /// Largest UDP datagram the reassembler will buffer.
    pub max_datagram_len: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            target: None,
            expected_payload_len: None,
            max_datagram_len: DEFAULT_MAX_DATAGRAM_LEN,
        }
    }
}

/// Mutable state of one run.
pub struct AnalysisContext {
    pub clock: PacketClock,
    pub tracker: SequenceTracker,
    pub report: AnalysisReport,
}

impl AnalysisContext {
    pub fn new(format: CaptureFormat) -> Self {
        Self {
            clock: PacketClock::new(),
            tracker: SequenceTracker::new(),
            report: AnalysisReport::new(format),
        }
    }

    /// Validate one packet and record what was found.
    pub fn observe(&mut self, record_index: u64, packet: &RtpPacket, delta_ms: i64) -> Observation {
        let validation = self.tracker.validate(packet, delta_ms);
        for anomaly in &validation.anomalies {
            debug!(
                record = record_index,
                packet = validation.packet_index,
                "{anomaly}"
            );
            self.report
                .note_anomaly(record_index, validation.packet_index, *anomaly);
        }

        let silence = scan_silence(packet.header.payload_type(), &packet.payload);
        self.tracker.record_silence(&silence);

        Observation {
            validation,
            silence,
        }
    }

    /// Close the run and produce its report.
    pub fn into_report(mut self) -> AnalysisReport {
        self.report.absorb(&self.tracker);
        self.report
    }
}

/// Per-packet result of [`AnalysisContext::observe`].
#[derive(Debug, Clone)]
pub struct Observation {
    pub validation: ValidationReport,
    pub silence: SilenceScan,
}

/// Reads one capture and runs it through reassembly, validation and emission.
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Map the file at `path` and analyze it.
    ///
    /// The mapping is released when this returns, on every path.
    pub fn run<P, A, R, T>(&self, path: P, emitter: &mut SessionEmitter<A, R, T>) -> Result<AnalysisReport>
    where
        P: AsRef<Path>,
        A: Write + Seek,
        R: Write,
        T: Write,
    {
        let view = CaptureView::open(path)?;
        info!(
            "analyzing {} ({} bytes)",
            view.path().display(),
            view.len()
        );
        self.analyze_bytes(view.bytes(), emitter)
    }

    /// Analyze an in-memory capture.
    pub fn analyze_bytes<A, R, T>(&self, data: &[u8], emitter: &mut SessionEmitter<A, R, T>) -> Result<AnalysisReport>
    where
        A: Write + Seek,
        R: Write,
        T: Write,
    {
        let format = classify(data)?;
        info!("input is a {} file", format.name());
        match format {
            CaptureFormat::RawCapture => self.analyze_capture(data, emitter),
            CaptureFormat::RecordedSession => self.analyze_recording(data, emitter),
        }
    }

    fn analyze_capture<A, R, T>(&self, data: &[u8], emitter: &mut SessionEmitter<A, R, T>) -> Result<AnalysisReport>
    where
        A: Write + Seek,
        R: Write,
        T: Write,
    {
        let target = self.config.target.ok_or_else(|| Error::Config {
            reason: "a raw capture needs a target address and port".to_string(),
        })?;

        let mut reassembler = FragmentReassembler::new(target)
            .with_expected_payload_len(self.config.expected_payload_len)
            .with_max_datagram_len(self.config.max_datagram_len);
        let mut ctx = AnalysisContext::new(CaptureFormat::RawCapture);
        let mut records = SnoopRecords::new(data);

        for record in records.by_ref() {
            let datagram = match reassembler.push(&record) {
                ReassemblyOutcome::Complete(datagram) => datagram,
                ReassemblyOutcome::Abandoned(mismatch) => {
                    debug!(record = record.index, "reassembly abandoned: {mismatch}");
                    continue;
                }
                ReassemblyOutcome::Pending | ReassemblyOutcome::Skipped(_) => continue,
            };

            debug!(
                record = datagram.record_index,
                "got datagram, {} bytes in {} fragment(s)",
                datagram.data.len(),
                datagram.fragments
            );

            let packet = match RtpPacket::parse(datagram.data) {
                Ok(packet) => packet,
                Err(e) => {
                    debug!(record = datagram.record_index, "skipping datagram: {e}");
                    continue;
                }
            };

            let delta_ms = ctx.clock.tick(datagram.timestamp);
            emitter.write_recording(delta_ms, &packet)?;

            let observation = ctx.observe(datagram.record_index, &packet, delta_ms);
            emitter.write_time_point(
                observation.validation.packet_index,
                packet.header.marker(),
                delta_ms,
            )?;
            log_packet(datagram.record_index, &packet, delta_ms, &observation);
            emitter.write_audio(&packet)?;
        }

        ctx.report.total_records = records.records_read();
        ctx.report.stop_reason = records.take_stop_reason();
        ctx.report.reassembly = Some(reassembler.stats().clone());
        Ok(ctx.into_report())
    }

    fn analyze_recording<A, R, T>(&self, data: &[u8], emitter: &mut SessionEmitter<A, R, T>) -> Result<AnalysisReport>
    where
        A: Write + Seek,
        R: Write,
        T: Write,
    {
        let mut ctx = AnalysisContext::new(CaptureFormat::RecordedSession);
        let mut frames = RecordingFrames::new(data);

        for (i, frame) in frames.by_ref().enumerate() {
            let index = i as u64 + 1;
            let delta_ms = frame.delta_ms as i64;

            let observation = ctx.observe(index, &frame.packet, delta_ms);
            log_packet(index, &frame.packet, delta_ms, &observation);
            emitter.write_audio(&frame.packet)?;
        }

        ctx.report.total_records = frames.frames_read();
        ctx.report.stop_reason = frames.take_stop_reason();
        Ok(ctx.into_report())
    }
}

/// One-line summary of a packet at debug, a hex dump at trace.
fn log_packet(record_index: u64, packet: &RtpPacket, delta_ms: i64, observation: &Observation) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        debug!(
            "{:5}:{:5}:  {:4}. bytes, {:4} ms:    {}{}",
            record_index,
            observation.validation.packet_index,
            packet.payload_len(),
            delta_ms,
            hex_bytes(&packet.header.to_bytes()),
            annotations(packet, delta_ms, &observation.silence)
        );
    }

    if tracing::enabled!(tracing::Level::TRACE) {
        trace!(
            "data length {}.{}",
            packet.payload_len(),
            hex_dump(&packet.to_bytes())
        );
    }
}

fn annotations(packet: &RtpPacket, delta_ms: i64, silence: &SilenceScan) -> String {
    let header = &packet.header;
    let mut out = String::new();
    if header.is_comfort_noise() {
        out.push_str(" COMFORT");
    }
    if header.marker() {
        out.push_str(" MARK");
        if header.is_comfort_noise() {
            out.push_str(" (MARK shouldn't be set with COMFORT!)");
        }
    } else if delta_ms < 20 {
        out.push_str(" -");
    } else if delta_ms > 20 {
        out.push_str(" +");
    }
    if let Some(first) = silence.first_non_silent {
        let _ = write!(out, " NON-SILENCE@{}={:02x}", first.offset, first.value);
    }
    if silence.contains_silence {
        out.push_str(" SILENCE");
    }
    out
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut out, b| {
        let _ = write!(out, "{b:3x}");
        out
    })
}

/// Rows of 16 bytes, each prefixed with its offset.
fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let _ = write!(out, "\n{:3x}:  {}", row * 16, hex_bytes(chunk));
    }
    out
}
