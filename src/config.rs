use std::path::PathBuf;

use crate::pipeline::types::VideoGeometry;

/// Resolved runtime configuration, assembled from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    /// H.264 elementary stream to replay as the capture source.
    pub input: PathBuf,
    /// Fixed output geometry for decoded frames.
    pub output: VideoGeometry,
    /// Replay pacing in access units per second.
    pub frame_rate: u32,
    /// Handoff queue capacity before drop-oldest kicks in.
    pub queue_capacity: usize,
    /// Restart the stream from the beginning when it ends.
    pub looped: bool,
}
