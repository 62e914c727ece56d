use std::collections::BTreeMap;

use super::histogram::DeltaHistogram;
use super::validator::SequenceTracker;
use crate::capture::CaptureFormat;
use crate::error::{AnomalyKind, CaptureError, ProtocolAnomaly};
use crate::reassembly::ReassemblyStats;

/// An anomaly tied to the packet it was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyEvent {
    /// 1-based index of the capture record (or recording frame).
    pub record_index: u64,
    /// 1-based index among processed packets.
    pub packet_index: u64,
    pub anomaly: ProtocolAnomaly,
}

/// Everything a run found, read out once the capture is exhausted.
#[derive(Debug)]
pub struct AnalysisReport {
    pub format: CaptureFormat,
    /// Records (or recording frames) read from the input.
    pub total_records: u64,
    pub packets_processed: u64,
    pub histogram: DeltaHistogram,
    pub total_elapsed_ms: u64,
    pub max_delay_ms: i64,
    pub silence_packets: u64,
    pub non_silence_packets: u64,
    pub anomaly_counts: BTreeMap<AnomalyKind, u64>,
    pub events: Vec<AnomalyEvent>,
    /// Reassembly counters; raw captures only.
    pub reassembly: Option<ReassemblyStats>,
    /// Why the input cursor stopped before the end of the file.
    pub stop_reason: Option<CaptureError>,
}

impl AnalysisReport {
    pub fn new(format: CaptureFormat) -> Self {
        Self {
            format,
            total_records: 0,
            packets_processed: 0,
            histogram: DeltaHistogram::new(),
            total_elapsed_ms: 0,
            max_delay_ms: 0,
            silence_packets: 0,
            non_silence_packets: 0,
            anomaly_counts: BTreeMap::new(),
            events: Vec::new(),
            reassembly: None,
            stop_reason: None,
        }
    }

    pub fn note_anomaly(&mut self, record_index: u64, packet_index: u64, anomaly: ProtocolAnomaly) {
        *self.anomaly_counts.entry(anomaly.kind()).or_insert(0) += 1;
        self.events.push(AnomalyEvent {
            record_index,
            packet_index,
            anomaly,
        });
    }

    /// Copy the end-of-run totals out of the tracker.
    pub fn absorb(&mut self, tracker: &SequenceTracker) {
        self.packets_processed = tracker.packets_processed();
        self.histogram = tracker.histogram().clone();
        self.total_elapsed_ms = tracker.total_elapsed_ms();
        self.max_delay_ms = tracker.max_delay_ms();
        self.silence_packets = tracker.silence_packets();
        self.non_silence_packets = tracker.non_silence_packets();
    }

    pub fn anomaly_count(&self, kind: AnomalyKind) -> u64 {
        self.anomaly_counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_anomalies(&self) -> u64 {
        self.anomaly_counts.values().sum()
    }

    /// Mean time between packets, `None` when nothing was processed.
    pub fn average_delta_ms(&self) -> Option<f64> {
        if self.packets_processed == 0 {
            return None;
        }
        Some(self.total_elapsed_ms as f64 / self.packets_processed as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_counting() {
        let mut report = AnalysisReport::new(CaptureFormat::RawCapture);
        report.note_anomaly(4, 2, ProtocolAnomaly::BadVersion { found: 0 });
        report.note_anomaly(
            9,
            5,
            ProtocolAnomaly::SequenceMismatch {
                expected: 3,
                received: 5,
            },
        );
        report.note_anomaly(12, 6, ProtocolAnomaly::BadVersion { found: 0x40 });

        assert_eq!(report.anomaly_count(AnomalyKind::BadVersion), 2);
        assert_eq!(report.anomaly_count(AnomalyKind::SequenceMismatch), 1);
        assert_eq!(report.anomaly_count(AnomalyKind::NegativeDelta), 0);
        assert_eq!(report.total_anomalies(), 3);
        assert_eq!(report.events[1].record_index, 9);
    }

    #[test]
    fn test_average_delta() {
        let mut report = AnalysisReport::new(CaptureFormat::RecordedSession);
        assert_eq!(report.average_delta_ms(), None);

        report.packets_processed = 4;
        report.total_elapsed_ms = 90;
        assert_eq!(report.average_delta_ms(), Some(22.5));
    }
}
