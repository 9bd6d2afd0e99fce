//! Continuous detection over a stream of frames.

mod capture;
mod controller;
mod source;

pub use capture::{CaptureSink, FileCaptureSink};
pub use controller::{
    Clock, StreamConfig, StreamController, StreamHandle, StreamState, SystemClock, TickOutcome,
};
pub use source::{DirectoryFrameSource, FrameSource, is_image_file};
