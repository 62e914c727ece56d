//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap
//! - Output file naming and creation
//! - Report printing

mod args;
mod output;

pub use args::{output_path, resolve_host, Args, EncodingArg};
pub use output::ReportPrinter;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use rtpsift_core::capture::CaptureFormat;
use rtpsift_core::emit::{AuWriter, RecordingWriter, SessionEmitter, TimePointWriter};
use rtpsift_core::io::CaptureView;
use rtpsift_core::pipeline::{Analyzer, AnalyzerConfig};

/// Analyze the input named by `args`, writing the report to `out`.
///
/// Time points, when requested, go to standard output.
pub fn run<W: Write>(args: &Args, out: &mut W) -> Result<()> {
    let view = CaptureView::open(&args.file)
        .with_context(|| format!("Failed to open input file: {}", args.file.display()))?;
    let format = view
        .format()
        .with_context(|| format!("Cannot analyze {}", args.file.display()))?;
    writeln!(out, "analyzing {} file... {}", format.name(), args.file.display())?;

    let raw = format == CaptureFormat::RawCapture;
    let target = if raw {
        let target = args
            .flow_target()?
            .context("A snoop capture needs a port (--to or --from) and an address (--ip)")?;
        info!(
            "following {} {}:{}",
            target.direction.as_str(),
            target.address,
            target.port
        );
        Some(target)
    } else {
        None
    };

    let mut emitter: SessionEmitter = SessionEmitter::new();

    if args.au {
        let path = output_path(&args.file, target.as_ref(), "au");
        let file = File::create(&path)
            .with_context(|| format!("Failed to create audio file: {}", path.display()))?;
        emitter = emitter.with_audio(AuWriter::new(BufWriter::new(file), args.audio_format())?);
        writeln!(out, "created audiofile {}", path.display())?;
    }

    if args.rtp {
        if raw {
            let path = output_path(&args.file, target.as_ref(), "rtp");
            let file = File::create(&path)
                .with_context(|| format!("Failed to create rtp file: {}", path.display()))?;
            emitter = emitter.with_recording(RecordingWriter::new(BufWriter::new(file))?);
            writeln!(out, "created rtp file {}", path.display())?;
        } else {
            warn!("--rtp only applies to snoop captures, ignoring");
        }
    }

    if args.time_points {
        if raw {
            emitter = emitter.with_time_points(TimePointWriter::new(io::stdout()));
        } else {
            warn!("--time-points only applies to snoop captures, ignoring");
        }
    }

    let config = AnalyzerConfig {
        target,
        expected_payload_len: args.expected_len,
        ..AnalyzerConfig::default()
    };
    let report = Analyzer::new(config)
        .analyze_bytes(view.bytes(), &mut emitter)
        .with_context(|| format!("Failed to analyze {}", args.file.display()))?;
    let outputs = emitter.finish().context("Failed to close output files")?;

    ReportPrinter::from_args(args).write(&report, &outputs.stats, out)?;
    Ok(())
}
