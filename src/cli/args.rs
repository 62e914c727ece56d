//! Command-line argument definitions.

use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};

use rtpsift_core::emit::{AudioEncoding, AudioFormat};
use rtpsift_core::reassembly::{Direction, FlowTarget};

/// Sample encoding written into the AU header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EncodingArg {
    /// 8-bit G.711 μ-law
    Pcmu,
    /// 16-bit linear PCM
    Pcm,
}

impl From<EncodingArg> for AudioEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Pcmu => AudioEncoding::Ulaw,
            EncodingArg::Pcm => AudioEncoding::Linear,
        }
    }
}

/// Reconstruct and check an RTP stream from a snoop capture or a session recording.
#[derive(Parser, Debug)]
#[command(name = "rtpsift")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Snoop capture or session recording to analyze
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Follow packets sent to this UDP port on --ip
    #[arg(long = "to", value_name = "PORT", conflicts_with = "from_port")]
    pub to_port: Option<u16>,

    /// Follow packets sent from this UDP port on --ip
    #[arg(long = "from", value_name = "PORT")]
    pub from_port: Option<u16>,

    /// Address of the followed endpoint (dotted quad or host name)
    #[arg(long = "ip", value_name = "HOST")]
    pub host: Option<String>,

    /// Only accept packets carrying exactly this many payload bytes
    #[arg(long = "len", value_name = "BYTES")]
    pub expected_len: Option<usize>,

    /// Report sequence, timestamp and version anomalies
    #[arg(long = "check-rtp")]
    pub check_rtp: bool,

    /// Count packets containing non-silent samples
    #[arg(long = "check-silence")]
    pub check_silence: bool,

    /// Count packets containing silent samples
    #[arg(long = "check-non-silence")]
    pub check_non_silence: bool,

    /// Write the payload to an AU audio file
    #[arg(long = "au")]
    pub au: bool,

    /// Re-serialize the stream as a session recording (raw captures only)
    #[arg(long = "rtp")]
    pub rtp: bool,

    /// Print a time point per packet for plotting (raw captures only)
    #[arg(short = 't', long = "time-points")]
    pub time_points: bool,

    /// Sample rate written into the AU header
    #[arg(long = "sample-rate", default_value = "8000")]
    pub sample_rate: u32,

    /// Channel count written into the AU header
    #[arg(long = "channels", default_value = "1")]
    pub channels: u32,

    /// Sample encoding written into the AU header
    #[arg(long = "encoding", value_enum, default_value = "pcmu")]
    pub encoding: EncodingArg,

    /// Enable verbose output (-v info, -vv per-packet lines, -vvv hex dumps)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Port and direction selected by --to or --from.
    pub fn port(&self) -> Option<(u16, Direction)> {
        match (self.to_port, self.from_port) {
            (Some(port), _) => Some((port, Direction::To)),
            (None, Some(port)) => Some((port, Direction::From)),
            (None, None) => None,
        }
    }

    /// The flow to follow, when both a port and an address were given.
    pub fn flow_target(&self) -> Result<Option<FlowTarget>> {
        let (Some((port, direction)), Some(host)) = (self.port(), self.host.as_deref()) else {
            return Ok(None);
        };
        let address = resolve_host(host)?;
        Ok(Some(FlowTarget::new(address, port, direction)))
    }

    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat {
            encoding: self.encoding.into(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

/// Parse a dotted quad, or resolve a host name to its first IPv4 address.
pub fn resolve_host(host: &str) -> Result<Ipv4Addr> {
    if let Ok(address) = host.parse::<Ipv4Addr>() {
        return Ok(address);
    }

    (host, 0)
        .to_socket_addrs()
        .with_context(|| format!("Unknown host {host}"))?
        .find_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .ok_or_else(|| anyhow!("Host {host} has no IPv4 address"))
}

/// Output file for `input` with extension `ext`.
///
/// Raw captures name the followed flow: `<input>.<to|from>.<port>.<ip>.<ext>`.
/// Recordings use `<input>.<ext>`.
pub fn output_path(input: &Path, target: Option<&FlowTarget>, ext: &str) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    if let Some(target) = target {
        name.push(format!(
            ".{}.{}.{}",
            target.direction.as_str(),
            target.port,
            target.address
        ));
    }
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
