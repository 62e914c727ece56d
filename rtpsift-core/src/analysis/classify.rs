//! Payload classification by RTP payload type.
//!
//! The payload types this system uses are PCMU at 8 kHz mono (type 0) plus a
//! dynamic range in which 102-110 carry 16-bit linear PCM and 111-119 carry
//! PCMU, at rates from 8 kHz to 48 kHz in mono or stereo. Every type is
//! framed at 20 ms.

/// Sample encoding, numbered as in the AU header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum AudioEncoding {
    /// 8-bit G.711 μ-law
    #[default]
    Ulaw = 1,
    /// 16-bit big-endian linear PCM
    Linear = 3,
}

impl AudioEncoding {
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Byte value of a silent sample.
    pub fn silence(&self) -> u8 {
        match self {
            AudioEncoding::Ulaw => 0xff,
            AudioEncoding::Linear => 0x00,
        }
    }
}

/// Framing of one payload type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadProfile {
    pub payload_type: u8,
    pub encoding: AudioEncoding,
    pub sample_rate: u32,
    pub channels: u32,
    /// Payload bytes in one 20 ms frame.
    pub frame_len: usize,
}

const fn profile(
    payload_type: u8,
    encoding: AudioEncoding,
    sample_rate: u32,
    channels: u32,
    frame_len: usize,
) -> PayloadProfile {
    PayloadProfile {
        payload_type,
        encoding,
        sample_rate,
        channels,
        frame_len,
    }
}

use AudioEncoding::{Linear, Ulaw};

static PAYLOAD_PROFILES: [PayloadProfile; 19] = [
    profile(0, Ulaw, 8_000, 1, 160),
    profile(102, Linear, 8_000, 2, 640),
    profile(103, Linear, 16_000, 1, 640),
    profile(104, Linear, 16_000, 2, 1280),
    profile(105, Linear, 32_000, 1, 1280),
    profile(106, Linear, 32_000, 2, 2560),
    profile(107, Linear, 44_100, 1, 1764),
    profile(108, Linear, 44_100, 2, 3528),
    profile(109, Linear, 48_000, 1, 1920),
    profile(110, Linear, 48_000, 2, 3840),
    profile(111, Ulaw, 8_000, 2, 320),
    profile(112, Ulaw, 16_000, 1, 320),
    profile(113, Ulaw, 16_000, 2, 640),
    profile(114, Ulaw, 32_000, 1, 640),
    profile(115, Ulaw, 32_000, 2, 1280),
    profile(116, Ulaw, 44_100, 1, 882),
    profile(117, Ulaw, 44_100, 2, 1764),
    profile(118, Ulaw, 48_000, 1, 960),
    profile(119, Ulaw, 48_000, 2, 1920),
];

/// Framing of a known payload type.
pub fn payload_profile(payload_type: u8) -> Option<&'static PayloadProfile> {
    PAYLOAD_PROFILES
        .iter()
        .find(|p| p.payload_type == payload_type)
}

/// Payload bytes expected in one frame, when the payload type is known.
pub fn expected_frame_length(payload_type: u8) -> Option<usize> {
    payload_profile(payload_type).map(|p| p.frame_len)
}

/// Encoding family of a payload type.
///
/// Unknown types at or below 112 are assumed linear, above 112 μ-law.
pub fn encoding_for(payload_type: u8) -> AudioEncoding {
    match payload_profile(payload_type) {
        Some(p) => p.encoding,
        None if payload_type > 112 => AudioEncoding::Ulaw,
        None => AudioEncoding::Linear,
    }
}

/// Byte value of a silent sample for this payload type.
///
/// Silence is judged on the payload type number alone: type 0 and types
/// above 112 scan for `0xff`, everything else for `0x00`. This differs from
/// [`encoding_for`] for 111 and 112.
pub fn silence_sentinel(payload_type: u8) -> u8 {
    if payload_type == 0 || payload_type > 112 {
        AudioEncoding::Ulaw.silence()
    } else {
        AudioEncoding::Linear.silence()
    }
}

pub fn is_silence(payload_type: u8, sample: u8) -> bool {
    sample == silence_sentinel(payload_type)
}

/// First sample that breaks silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonSilence {
    /// Offset into the payload.
    pub offset: usize,
    pub value: u8,
}

/// Result of scanning a payload for silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SilenceScan {
    /// First non-silent sample, if any.
    pub first_non_silent: Option<NonSilence>,
    /// Whether any sample equals the silence value.
    pub contains_silence: bool,
}

impl SilenceScan {
    /// Every sample is silent (vacuously true for an empty payload).
    pub fn is_silent(&self) -> bool {
        self.first_non_silent.is_none()
    }
}

/// Scan a payload against the silence value of its payload type.
///
/// Both searches stop at their first hit.
pub fn scan_silence(payload_type: u8, payload: &[u8]) -> SilenceScan {
    let sentinel = silence_sentinel(payload_type);
    SilenceScan {
        first_non_silent: payload
            .iter()
            .position(|&b| b != sentinel)
            .map(|offset| NonSilence {
                offset,
                value: payload[offset],
            }),
        contains_silence: payload.contains(&sentinel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_lengths() {
        assert_eq!(expected_frame_length(0), Some(160));
        assert_eq!(expected_frame_length(108), Some(3528));
        assert_eq!(expected_frame_length(116), Some(882));
        assert_eq!(expected_frame_length(119), Some(1920));
        // Gaps in the table
        assert_eq!(expected_frame_length(8), None);
        assert_eq!(expected_frame_length(13), None);
        assert_eq!(expected_frame_length(101), None);
        assert_eq!(expected_frame_length(120), None);
    }

    #[test]
    fn test_frame_length_matches_rate() {
        for p in PAYLOAD_PROFILES.iter() {
            let bytes_per_sample = match p.encoding {
                AudioEncoding::Ulaw => 1,
                AudioEncoding::Linear => 2,
            };
            let per_20ms = p.sample_rate as usize / 50 * p.channels as usize * bytes_per_sample;
            assert_eq!(per_20ms, p.frame_len, "payload type {}", p.payload_type);
        }
    }

    #[test]
    fn test_silence_sentinel() {
        assert_eq!(silence_sentinel(0), 0xff);
        assert_eq!(silence_sentinel(104), 0x00);
        assert_eq!(silence_sentinel(113), 0xff);
        assert_eq!(silence_sentinel(119), 0xff);
        // Unlisted types fall back on the numeric split
        assert_eq!(silence_sentinel(96), 0x00);
        assert_eq!(silence_sentinel(127), 0xff);
        assert!(is_silence(0, 0xff));
        assert!(!is_silence(0, 0x00));
    }

    #[test]
    fn test_low_ulaw_types_scan_for_zero() {
        // 111 and 112 are listed as μ-law but still scan against 0x00
        assert_eq!(encoding_for(111), AudioEncoding::Ulaw);
        assert_eq!(silence_sentinel(111), 0x00);
        assert_eq!(silence_sentinel(112), 0x00);
        assert!(is_silence(112, 0x00));
        assert!(!is_silence(112, 0xff));
    }

    #[test]
    fn test_linear_silence_flips_on_one_byte() {
        let mut payload = vec![0u8; 640];
        let scan = scan_silence(102, &payload);
        assert!(scan.is_silent());
        assert!(scan.contains_silence);

        payload[300] = 0x01;
        let scan = scan_silence(102, &payload);
        assert!(!scan.is_silent());
        assert_eq!(
            scan.first_non_silent,
            Some(NonSilence {
                offset: 300,
                value: 0x01
            })
        );
    }

    #[test]
    fn test_ulaw_payload_without_silence() {
        let scan = scan_silence(0, &[0x7e; 160]);
        assert!(!scan.is_silent());
        assert!(!scan.contains_silence);
        assert_eq!(scan.first_non_silent.map(|n| n.offset), Some(0));
    }

    #[test]
    fn test_empty_payload() {
        let scan = scan_silence(0, &[]);
        assert!(scan.is_silent());
        assert!(!scan.contains_silence);
    }
}
