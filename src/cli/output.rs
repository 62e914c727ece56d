//! End-of-run report printing.

use std::io::{self, Write};

use rtpsift_core::analysis::AnalysisReport;
use rtpsift_core::emit::EmitterStats;
use rtpsift_core::error::AnomalyKind;

use super::Args;

/// Writes the human-readable report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportPrinter {
    pub check_rtp: bool,
    pub check_silence: bool,
    pub check_non_silence: bool,
}

impl ReportPrinter {
    pub fn from_args(args: &Args) -> Self {
        Self {
            check_rtp: args.check_rtp,
            check_silence: args.check_silence,
            check_non_silence: args.check_non_silence,
        }
    }

    pub fn write<W: Write>(
        &self,
        report: &AnalysisReport,
        emitted: &EmitterStats,
        out: &mut W,
    ) -> io::Result<()> {
        if self.check_rtp {
            for event in &report.events {
                writeln!(
                    out,
                    "packet {}:{}., {}",
                    event.record_index, event.packet_index, event.anomaly
                )?;
            }

            writeln!(out, "ms\tpackets")?;
            for (ms, packets) in report.histogram.rows() {
                writeln!(out, "{ms}\t{packets}")?;
            }
            if let Some(average) = report.average_delta_ms() {
                writeln!(out, "Average time between packets {average:.6} ms")?;
            }
            writeln!(out, "Max delay {} ms", report.max_delay_ms)?;

            for kind in AnomalyKind::ALL {
                let count = report.anomaly_count(kind);
                if count != 0 {
                    writeln!(out, "{count}. {}", kind.as_str())?;
                }
            }
        }

        if self.check_silence {
            writeln!(out, "{}. non-silence packets", report.non_silence_packets)?;
        }
        if self.check_non_silence {
            writeln!(out, "{}. silence packets", report.silence_packets)?;
        }

        if let Some(stats) = &report.reassembly {
            writeln!(
                out,
                "datagrams {}, fragments {}, abandoned reassemblies {}",
                stats.datagrams, stats.fragments, stats.abandoned
            )?;
            writeln!(
                out,
                "skipped: non-ip {}, malformed {}, non-udp {}, wrong ip {}, wrong port {}, wrong length {}",
                stats.not_ipv4,
                stats.malformed,
                stats.not_udp,
                stats.wrong_address,
                stats.wrong_port,
                stats.unexpected_length
            )?;
        }

        if emitted.audio_frames != 0 {
            writeln!(
                out,
                "audio: {} bytes from {} packets",
                emitted.audio_bytes, emitted.audio_frames
            )?;
        }
        if emitted.recording_frames != 0 {
            writeln!(out, "recording: {} packets", emitted.recording_frames)?;
        }

        if let Some(reason) = &report.stop_reason {
            writeln!(out, "input ended early: {reason}")?;
        }

        writeln!(
            out,
            "total packets in input file {}., packets processed {}",
            report.total_records, report.packets_processed
        )
    }
}

#[cfg(test)]
mod tests {
    use rtpsift_core::capture::CaptureFormat;
    use rtpsift_core::error::ProtocolAnomaly;

    use super::*;

    fn render(printer: ReportPrinter, report: &AnalysisReport) -> String {
        let mut out = Vec::new();
        printer
            .write(report, &EmitterStats::default(), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn sample_report() -> AnalysisReport {
        let mut report = AnalysisReport::new(CaptureFormat::RecordedSession);
        report.total_records = 3;
        report.packets_processed = 3;
        report.total_elapsed_ms = 61;
        report.max_delay_ms = 21;
        report.histogram.record(20);
        report.histogram.record(20);
        report.histogram.record(21);
        report.non_silence_packets = 2;
        report.note_anomaly(
            3,
            3,
            ProtocolAnomaly::SequenceMismatch {
                expected: 9,
                received: 11,
            },
        );
        report
    }

    #[test]
    fn test_default_report_is_totals_only() {
        let text = render(ReportPrinter::default(), &sample_report());
        assert_eq!(text, "total packets in input file 3., packets processed 3\n");
    }

    #[test]
    fn test_checks_enabled() {
        let printer = ReportPrinter {
            check_rtp: true,
            check_silence: true,
            check_non_silence: false,
        };
        let text = render(printer, &sample_report());
        assert!(text.starts_with("packet 3:3., out of sequence packet"));
        assert!(text.contains("ms\tpackets\n20\t2\n21\t1\n"));
        assert!(text.contains("Average time between packets 20.333333 ms"));
        assert!(text.contains("Max delay 21 ms\n"));
        assert!(text.ends_with("total packets in input file 3., packets processed 3\n"));
        assert!(text.contains("1. sequence_mismatch\n"));
        assert!(text.contains("2. non-silence packets\n"));
        assert!(!text.contains(". silence packets"));
    }
}
