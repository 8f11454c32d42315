//! Access-unit classification and stream synchronization gating
//!
//! A decoder fed mid-stream data without parameter context can misbehave,
//! so nothing is decoded until the first sequence parameter set arrives.
//! Once a parameter set has been seen, every subsequent access unit is
//! forwarded to the decoder regardless of type.

use crate::pipeline::health::PipelineHealth;
use log::{debug, info, warn};
use std::sync::Arc;

/// Annex B start code delimiting access units.
pub const START_CODE: [u8; 4] = [0, 0, 0, 1];

/// The NAL type is the low 5 bits of the byte following the start code.
pub const NAL_TYPE_MASK: u8 = 0x1F;
pub const NAL_TYPE_IDR: u8 = 5;
pub const NAL_TYPE_SPS: u8 = 7;
pub const NAL_TYPE_PPS: u8 = 8;

/// What the decode stage should do with an access unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Drop the unit: malformed, or the stream is not yet synchronized.
    Skip,
    /// First decodable unit of the session (a parameter set); begin decoding.
    StartDecode,
    /// The stream is synchronized; forward to the decoder.
    ContinueDecode,
}

/// Session-scoped classifier holding the "parameter set seen" latch.
///
/// The latch is monotonic: false until the first sequence parameter set,
/// true for the rest of the session. A new streaming session gets a fresh
/// classifier.
pub struct AccessUnitClassifier {
    synchronized: bool,
    health: Arc<PipelineHealth>,
}

impl AccessUnitClassifier {
    pub fn new(health: Arc<PipelineHealth>) -> Self {
        Self {
            synchronized: false,
            health,
        }
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Classify one access unit.
    ///
    /// Units without the four-byte start code (or too short to carry a
    /// type field) are malformed: they are counted and skipped without
    /// ever inspecting the type field.
    pub fn classify(&mut self, unit: &[u8]) -> Classification {
        if unit.len() <= START_CODE.len() || unit[..START_CODE.len()] != START_CODE {
            warn!(
                "malformed access unit ({} bytes): no start code or truncated, skipping",
                unit.len()
            );
            self.health.record_malformed_unit();
            return Classification::Skip;
        }

        if self.synchronized {
            return Classification::ContinueDecode;
        }

        let nal_type = unit[START_CODE.len()] & NAL_TYPE_MASK;
        if nal_type == NAL_TYPE_SPS {
            self.synchronized = true;
            info!("stream synchronized: sequence parameter set received");
            Classification::StartDecode
        } else {
            debug!("awaiting parameter set, skipping nal type {}", nal_type);
            Classification::Skip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(nal_type: u8) -> Vec<u8> {
        vec![0, 0, 0, 1, nal_type, 0xAA, 0xBB]
    }

    fn classifier() -> AccessUnitClassifier {
        AccessUnitClassifier::new(Arc::new(PipelineHealth::new()))
    }

    #[test]
    fn test_skips_everything_before_parameter_set() {
        let mut classifier = classifier();

        for nal_type in [NAL_TYPE_IDR, NAL_TYPE_PPS, 1] {
            assert_eq!(classifier.classify(&unit(nal_type)), Classification::Skip);
            assert!(!classifier.is_synchronized());
        }
    }

    #[test]
    fn test_parameter_set_latches_synchronization() {
        let mut classifier = classifier();

        assert_eq!(
            classifier.classify(&unit(NAL_TYPE_SPS)),
            Classification::StartDecode
        );
        assert!(classifier.is_synchronized());

        // Everything flows through afterwards, parameter sets included
        for nal_type in [NAL_TYPE_PPS, NAL_TYPE_IDR, 1, NAL_TYPE_SPS] {
            assert_eq!(
                classifier.classify(&unit(nal_type)),
                Classification::ContinueDecode
            );
        }
        assert!(classifier.is_synchronized());
    }

    #[test]
    fn test_malformed_units_are_counted_and_skipped() {
        let health = Arc::new(PipelineHealth::new());
        let mut classifier = AccessUnitClassifier::new(Arc::clone(&health));

        // Too short to carry a type field
        assert_eq!(classifier.classify(&[0, 0, 1]), Classification::Skip);
        assert_eq!(classifier.classify(&[0, 0, 0, 1]), Classification::Skip);
        // Wrong prefix
        assert_eq!(
            classifier.classify(&[1, 2, 3, 4, 5, 6]),
            Classification::Skip
        );

        assert_eq!(health.malformed_units(), 3);
        assert!(!classifier.is_synchronized());
    }

    #[test]
    fn test_malformed_after_sync_does_not_reach_decoder() {
        let mut classifier = classifier();
        classifier.classify(&unit(NAL_TYPE_SPS));

        assert_eq!(classifier.classify(&[0xFF; 8]), Classification::Skip);
        // The latch is unaffected
        assert!(classifier.is_synchronized());
        assert_eq!(
            classifier.classify(&unit(NAL_TYPE_IDR)),
            Classification::ContinueDecode
        );
    }
}
