//! Capture file I/O.
//!
//! Captures are mapped into memory once and consumed through forward-only
//! cursors (see [`crate::capture`]). Nothing in this crate writes to the
//! mapped region.

mod mmap;

pub use mmap::CaptureView;
