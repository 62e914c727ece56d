//! RTP stream validation.
//!
//! [`PacketClock`] turns capture timestamps into per-packet millisecond
//! deltas and [`SequenceTracker`] checks each packet against the stream so
//! far. The tracker never tries to recover the "true" sequence: after every
//! packet it resynchronizes to what it just saw, so one discontinuity is
//! reported once instead of on every later packet.

use smallvec::SmallVec;

use super::classify::expected_frame_length;
use super::histogram::DeltaHistogram;
use super::SilenceScan;
use crate::capture::CaptureTimestamp;
use crate::error::ProtocolAnomaly;
use crate::protocol::{RtpPacket, RTP_VERSION_BYTE};

/// Delta assigned to the first packet of a run: one 20 ms frame.
pub const FIRST_PACKET_DELTA_MS: i64 = 20;

/// Microseconds to milliseconds, rounding halves up.
pub fn micros_to_ms(micros: i64) -> i64 {
    (micros + 500).div_euclid(1000)
}

/// Per-packet timing derived from capture timestamps.
#[derive(Debug, Clone, Default)]
pub struct PacketClock {
    last: Option<CaptureTimestamp>,
}

impl PacketClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds since the previous packet; the first packet gets
    /// [`FIRST_PACKET_DELTA_MS`]. May be negative if the capture clock
    /// stepped backwards.
    pub fn tick(&mut self, timestamp: CaptureTimestamp) -> i64 {
        let delta = match self.last {
            None => FIRST_PACKET_DELTA_MS,
            Some(previous) => micros_to_ms(timestamp.micros_since(&previous)),
        };
        self.last = Some(timestamp);
        delta
    }
}

/// What the tracker concluded about one packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// 1-based position among processed packets.
    pub packet_index: u64,
    /// Delta as counted in the histogram: never negative, 0 for comfort noise.
    pub delta_ms: i64,
    pub bucket: usize,
    pub anomalies: SmallVec<[ProtocolAnomaly; 4]>,
    pub comfort_noise: bool,
    pub marker: bool,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

/// Running state of one analysis run.
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    /// `None` until the first packet seeds the tracker.
    expected_seq: Option<u16>,
    expected_timestamp: u32,
    total_elapsed_ms: u64,
    max_delay_ms: i64,
    histogram: DeltaHistogram,
    /// Previous packet was comfort noise; this packet's delta is not real audio time.
    comfort_pending: bool,
    packets_processed: u64,
    silence_packets: u64,
    non_silence_packets: u64,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check one packet and fold it into the running state.
    ///
    /// `delta_ms` is the time since the previous packet.
    pub fn validate(&mut self, packet: &RtpPacket, delta_ms: i64) -> ValidationReport {
        let header = &packet.header;
        let comfort_noise = header.is_comfort_noise();
        let marker = header.marker();
        let mut anomalies = SmallVec::new();

        self.packets_processed += 1;

        // Comfort noise advances the media clock by one unit when it carries anything
        let samples = if comfort_noise {
            packet.payload_len().min(1)
        } else {
            packet.payload_len()
        };

        if let Some(expected) = expected_frame_length(header.payload_type()) {
            if !comfort_noise && packet.payload_len() != expected {
                anomalies.push(ProtocolAnomaly::UnusualLength {
                    payload_type: header.payload_type(),
                    expected,
                    actual: packet.payload_len(),
                });
            }
        }

        if header.version_flags != RTP_VERSION_BYTE {
            anomalies.push(ProtocolAnomaly::BadVersion {
                found: header.version_flags,
            });
        }

        let mut delta = delta_ms;
        if delta < 0 {
            anomalies.push(ProtocolAnomaly::NegativeDelta { delta_ms });
            delta = 0;
        }
        if comfort_noise {
            delta = 0;
        }

        self.max_delay_ms = self.max_delay_ms.max(delta);
        let bucket = self.histogram.record(delta);
        // Elapsed time accumulates the clamped bucket, not the raw delta
        if !self.comfort_pending || comfort_noise {
            self.total_elapsed_ms += bucket as u64;
        }
        self.comfort_pending = comfort_noise;

        let mut out_of_sequence = false;
        if let Some(expected) = self.expected_seq {
            if header.sequence != expected {
                out_of_sequence = true;
                anomalies.push(ProtocolAnomaly::SequenceMismatch {
                    expected,
                    received: header.sequence,
                });
            }

            // A marked packet starts a talk spurt, where the timestamp may jump
            if !marker
                && !out_of_sequence
                && samples > 0
                && header.timestamp != self.expected_timestamp
            {
                anomalies.push(ProtocolAnomaly::TimestampMismatch {
                    expected: self.expected_timestamp,
                    received: header.timestamp,
                });
            }
        }

        self.expected_seq = Some(header.sequence.wrapping_add(1));
        self.expected_timestamp = header.timestamp.wrapping_add(samples as u32);

        ValidationReport {
            packet_index: self.packets_processed,
            delta_ms: delta,
            bucket,
            anomalies,
            comfort_noise,
            marker,
        }
    }

    /// Count a packet's silence scan.
    pub fn record_silence(&mut self, scan: &SilenceScan) {
        if !scan.is_silent() {
            self.non_silence_packets += 1;
        }
        if scan.contains_silence {
            self.silence_packets += 1;
        }
    }

    /// Sequence number the next packet should carry.
    pub fn expected_seq(&self) -> Option<u16> {
        self.expected_seq
    }

    pub fn expected_timestamp(&self) -> u32 {
        self.expected_timestamp
    }

    pub fn packets_processed(&self) -> u64 {
        self.packets_processed
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.total_elapsed_ms
    }

    /// Largest delta seen, before histogram clamping.
    pub fn max_delay_ms(&self) -> i64 {
        self.max_delay_ms
    }

    pub fn histogram(&self) -> &DeltaHistogram {
        &self.histogram
    }

    /// Packets with at least one silent sample.
    pub fn silence_packets(&self) -> u64 {
        self.silence_packets
    }

    /// Packets with at least one non-silent sample.
    pub fn non_silence_packets(&self) -> u64 {
        self.non_silence_packets
    }
}
