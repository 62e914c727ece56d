//! Integration tests for the rtpsift command line.
//!
//! Runs the CLI over synthetic captures written to a temporary directory.

use std::fs;
use std::path::Path;

use clap::Parser;

use rtpsift::cli::{run, Args};
use rtpsift_core::capture::RecordingFrames;
use rtpsift_core::test_utils::{rtp_over_ipv4, RtpBuilder, SnoopCaptureBuilder};

const PHONE: [u8; 4] = [192, 168, 10, 21];
const BRIDGE: [u8; 4] = [192, 168, 10, 1];

/// Four μ-law packets to the bridge; the third one is lost.
fn write_capture(path: &Path) {
    let mut builder = SnoopCaptureBuilder::new();
    for (i, seq) in [10u16, 11, 13, 14].into_iter().enumerate() {
        let samples = if seq == 14 { vec![0x55; 160] } else { vec![0xff; 160] };
        let rtp = RtpBuilder::new()
            .sequence(seq)
            .timestamp(seq as u32 * 160)
            .payload(samples)
            .build();
        let packet = rtp_over_ipv4(PHONE, BRIDGE, 16_000, 6_000, rtp);
        builder = builder.ipv4(1_000, i as u32 * 20_000, &packet);
    }
    fs::write(path, builder.build()).unwrap();
}

fn run_cli(argv: &[&str]) -> anyhow::Result<String> {
    let args = Args::try_parse_from(argv)?;
    let mut out = Vec::new();
    run(&args, &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn test_report_for_snoop_capture() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("call.snoop");
    write_capture(&input);

    let text = run_cli(&[
        "rtpsift",
        input.to_str().unwrap(),
        "--to",
        "6000",
        "--ip",
        "192.168.10.1",
        "--check-rtp",
        "--check-silence",
    ])
    .unwrap();

    assert!(text.contains("analyzing snoop file..."));
    assert!(text.contains("packet 3:3., out of sequence packet"));
    assert!(text.contains("ms\tpackets\n20\t4\n"));
    assert!(text.contains("1. non-silence packets"));
    assert!(text.contains("total packets in input file 4., packets processed 4"));
}

#[test]
fn test_writes_named_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("call.snoop");
    write_capture(&input);

    run_cli(&[
        "rtpsift",
        input.to_str().unwrap(),
        "--to",
        "6000",
        "--ip",
        "192.168.10.1",
        "--au",
        "--rtp",
    ])
    .unwrap();

    let au = fs::read(dir.path().join("call.snoop.to.6000.192.168.10.1.au")).unwrap();
    assert_eq!(&au[8..12], &640u32.to_be_bytes());
    assert_eq!(au.len(), 24 + 640);

    let recording = fs::read(dir.path().join("call.snoop.to.6000.192.168.10.1.rtp")).unwrap();
    let sequences: Vec<u16> = RecordingFrames::new(&recording)
        .map(|f| f.packet.header.sequence)
        .collect();
    assert_eq!(sequences, vec![10, 11, 13, 14]);

    // The recording is itself analyzable, producing audio named after it
    let rec_input = dir.path().join("call.snoop.to.6000.192.168.10.1.rtp");
    let text = run_cli(&["rtpsift", rec_input.to_str().unwrap(), "--au"]).unwrap();
    assert!(text.contains("analyzing recording file..."));
    let replayed = fs::read(dir.path().join("call.snoop.to.6000.192.168.10.1.rtp.au")).unwrap();
    assert_eq!(replayed, au);
}

#[test]
fn test_snoop_capture_without_target_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("call.snoop");
    write_capture(&input);

    let err = run_cli(&["rtpsift", input.to_str().unwrap(), "--to", "6000"]).unwrap_err();
    assert!(err.to_string().contains("--ip"));
}

#[test]
fn test_unrecognized_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, b"hello, world").unwrap();

    assert!(run_cli(&["rtpsift", input.to_str().unwrap()]).is_err());
}
