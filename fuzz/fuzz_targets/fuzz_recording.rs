//! Fuzz target for session recordings.
//!
//! Feeds arbitrary bytes to the recording cursor and the full analyzer; a
//! recording needs no flow target, so every input reaches the validator.

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use rtpsift_core::capture::RecordingFrames;
use rtpsift_core::emit::{AudioFormat, AuWriter, RecordingWriter, SessionEmitter};
use rtpsift_core::pipeline::{Analyzer, AnalyzerConfig};

fuzz_target!(|data: &[u8]| {
    for frame in RecordingFrames::new(data) {
        // Whatever was decoded must encode again
        let mut out = Vec::new();
        let _ = frame.write_to(&mut out);
    }

    let audio = match AuWriter::new(Cursor::new(Vec::new()), AudioFormat::default()) {
        Ok(audio) => audio,
        Err(_) => return,
    };
    let recording = match RecordingWriter::new(Vec::new()) {
        Ok(recording) => recording,
        Err(_) => return,
    };
    let mut emitter: SessionEmitter<Cursor<Vec<u8>>, Vec<u8>, Vec<u8>> = SessionEmitter::new()
        .with_audio(audio)
        .with_recording(recording);
    let _ = Analyzer::new(AnalyzerConfig::default()).analyze_bytes(data, &mut emitter);
    let _ = emitter.finish();
});
