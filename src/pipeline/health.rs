//! Health counters for the frame pipeline

use std::sync::atomic::{AtomicU64, Ordering};

/// Health metrics for a pipeline session
///
/// Shared between the capture/decode context and the presentation context;
/// all fields use atomic operations for thread-safe access.
pub struct PipelineHealth {
    /// Access units rejected for a missing start code
    pub malformed_units: AtomicU64,

    /// Decoder submit or drain failures
    pub decode_failures: AtomicU64,

    /// Frames lost to a failed color-space conversion
    pub convert_failures: AtomicU64,

    /// Presentation frames published to the handoff queue
    pub frames_published: AtomicU64,

    /// Frames uploaded and presented by the consumer
    pub frames_presented: AtomicU64,

    /// Frames evicted or rejected by the handoff queue
    pub queue_drops: AtomicU64,

    /// Compressed bytes handed to the decoder
    pub bytes_ingested: AtomicU64,
}

impl PipelineHealth {
    pub fn new() -> Self {
        Self {
            malformed_units: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            convert_failures: AtomicU64::new(0),
            frames_published: AtomicU64::new(0),
            frames_presented: AtomicU64::new(0),
            queue_drops: AtomicU64::new(0),
            bytes_ingested: AtomicU64::new(0),
        }
    }

    pub fn record_malformed_unit(&self) {
        self.malformed_units.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_convert_failure(&self) {
        self.convert_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_published(&self) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_presented(&self) {
        self.frames_presented.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue_drop(&self) {
        self.queue_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingest(&self, bytes: usize) {
        self.bytes_ingested.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn malformed_units(&self) -> u64 {
        self.malformed_units.load(Ordering::Relaxed)
    }

    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    pub fn convert_failures(&self) -> u64 {
        self.convert_failures.load(Ordering::Relaxed)
    }

    pub fn frames_published(&self) -> u64 {
        self.frames_published.load(Ordering::Relaxed)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented.load(Ordering::Relaxed)
    }

    pub fn queue_drops(&self) -> u64 {
        self.queue_drops.load(Ordering::Relaxed)
    }

    pub fn bytes_ingested(&self) -> u64 {
        self.bytes_ingested.load(Ordering::Relaxed)
    }

    /// Get a summary of health metrics
    pub fn summary(&self) -> HealthSummary {
        HealthSummary {
            frames_published: self.frames_published(),
            frames_presented: self.frames_presented(),
            queue_drops: self.queue_drops(),
            malformed_units: self.malformed_units(),
            decode_failures: self.decode_failures(),
            convert_failures: self.convert_failures(),
            bytes_ingested: self.bytes_ingested(),
        }
    }
}

impl Default for PipelineHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of health metrics
#[derive(Debug, Clone)]
pub struct HealthSummary {
    pub frames_published: u64,
    pub frames_presented: u64,
    pub queue_drops: u64,
    pub malformed_units: u64,
    pub decode_failures: u64,
    pub convert_failures: u64,
    pub bytes_ingested: u64,
}

impl std::fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Health: {} published, {} presented, {} queue drops, {} malformed units, {} decode failures, {} convert failures, {} bytes ingested",
            self.frames_published,
            self.frames_presented,
            self.queue_drops,
            self.malformed_units,
            self.decode_failures,
            self.convert_failures,
            self.bytes_ingested
        )
    }
}
