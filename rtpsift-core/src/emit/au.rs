//! Sun AU audio output.
//!
//! ```text
//! magic        u32   0x2e736e64 (".snd")
//! header_size  u32   24
//! data_size    u32   written as 0, patched by finish()
//! encoding     u32   1 = μ-law, 3 = 16-bit linear
//! sample_rate  u32
//! channels     u32
//! samples      ...
//! ```

use std::io::{self, Seek, SeekFrom, Write};

use crate::analysis::AudioEncoding;

pub const AU_MAGIC: u32 = 0x2e73_6e64;
pub const AU_HEADER_LEN: usize = 24;

/// Position of the data_size field.
const DATA_SIZE_OFFSET: u64 = 8;

/// Sample format written into the AU header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub encoding: AudioEncoding,
    pub sample_rate: u32,
    pub channels: u32,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            encoding: AudioEncoding::Ulaw,
            sample_rate: 8_000,
            channels: 1,
        }
    }
}

impl AudioFormat {
    pub fn header(&self, data_size: u32) -> [u8; AU_HEADER_LEN] {
        let mut header = [0u8; AU_HEADER_LEN];
        header[0..4].copy_from_slice(&AU_MAGIC.to_be_bytes());
        header[4..8].copy_from_slice(&(AU_HEADER_LEN as u32).to_be_bytes());
        header[8..12].copy_from_slice(&data_size.to_be_bytes());
        header[12..16].copy_from_slice(&self.encoding.code().to_be_bytes());
        header[16..20].copy_from_slice(&self.sample_rate.to_be_bytes());
        header[20..24].copy_from_slice(&self.channels.to_be_bytes());
        header
    }
}

/// Writes raw samples after an AU header whose length is fixed up at the end.
pub struct AuWriter<W: Write + Seek> {
    inner: W,
    format: AudioFormat,
    data_size: u64,
}

impl<W: Write + Seek> AuWriter<W> {
    /// Write the header with a zero data size.
    pub fn new(mut inner: W, format: AudioFormat) -> io::Result<Self> {
        inner.write_all(&format.header(0))?;
        Ok(Self {
            inner,
            format,
            data_size: 0,
        })
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn write_samples(&mut self, samples: &[u8]) -> io::Result<()> {
        self.inner.write_all(samples)?;
        self.data_size += samples.len() as u64;
        Ok(())
    }

    /// Sample bytes written so far.
    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// Patch the data size into the header and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        let data_size = u32::try_from(self.data_size).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} bytes of audio do not fit an AU header", self.data_size),
            )
        })?;

        self.inner.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
        self.inner.write_all(&data_size.to_be_bytes())?;
        self.inner.seek(SeekFrom::End(0))?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}
