//! rtpsift - Reconstruct and check RTP voice streams from packet captures.
//!
//! The analysis itself lives in [`rtpsift_core`]; this crate adds the
//! command-line front end.
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use rtpsift::cli::{run, Args};
//!
//! fn main() -> anyhow::Result<()> {
//!     let args = Args::parse_from(["rtpsift", "call.snoop", "--to", "5004", "--ip", "10.0.0.7"]);
//!     run(&args, &mut std::io::stdout())
//! }
//! ```

pub mod cli;
