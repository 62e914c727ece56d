//! Session outputs: an AU audio track, a re-serialized session recording,
//! and a time-point trace for plotting.

mod au;
mod recording;
mod session;
mod time_points;

pub use au::{AudioFormat, AuWriter, AU_HEADER_LEN, AU_MAGIC};
pub use recording::RecordingWriter;
pub use session::{EmitterOutputs, EmitterStats, SessionEmitter};
pub use time_points::{time_point, TimePointWriter, MARKER_TIME_POINT_MS, TIME_POINT_CAP_MS};

pub use crate::analysis::AudioEncoding;
