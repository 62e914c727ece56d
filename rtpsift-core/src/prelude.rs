//! Convenient re-exports for common usage.
//!
//! ```rust,no_run
//! use rtpsift_core::prelude::*;
//!
//! let analyzer = Analyzer::new(AnalyzerConfig::default());
//! ```

// Pipeline
pub use crate::pipeline::{Analyzer, AnalyzerConfig};

// Flow selection
pub use crate::reassembly::{Direction, FlowTarget};

// Outputs
pub use crate::emit::{AudioEncoding, AudioFormat, AuWriter, RecordingWriter, SessionEmitter, TimePointWriter};

// Results
pub use crate::analysis::{AnalysisReport, AnomalyEvent};
pub use crate::capture::CaptureFormat;

// Error types
pub use crate::error::{AnomalyKind, Error, ProtocolAnomaly, Result};
