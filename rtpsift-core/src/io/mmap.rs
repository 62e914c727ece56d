//! Memory-mapped capture input.
//!
//! Uses the `memmap2` crate for platform-independent memory mapping. The
//! whole capture is mapped read-only for the duration of one analysis run and
//! unmapped when the [`CaptureView`] is dropped, on success and error paths
//! alike.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::capture::{classify, CaptureFormat};
use crate::error::{CaptureError, Error};

/// A read-only view over a mapped capture file.
pub struct CaptureView {
    /// Path to the file (for error messages)
    path: PathBuf,
    /// Memory-mapped region. `None` for an empty file, which cannot be mapped.
    mmap: Option<Mmap>,
}

impl CaptureView {
    /// Open and map a capture file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| CaptureError::Open {
            path: path.clone(),
            source,
        })?;

        let size = file
            .metadata()
            .map_err(|source| CaptureError::Open {
                path: path.clone(),
                source,
            })?
            .len();

        let mmap = if size == 0 {
            None
        } else {
            // The map is private and read-only; the file is not expected to
            // change while it is being analyzed.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|source| CaptureError::Map {
                path: path.clone(),
                source,
            })?;
            Some(mmap)
        };

        Ok(Self { path, mmap })
    }

    /// Get the path to the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The mapped bytes.
    pub fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Size of the mapped file in bytes.
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Classify the mapped capture by its magic prefix.
    pub fn format(&self) -> Result<CaptureFormat, Error> {
        Ok(classify(self.bytes())?)
    }
}

impl std::fmt::Debug for CaptureView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureView")
            .field("path", &self.path)
            .field("size_bytes", &self.len())
            .finish()
    }
}
