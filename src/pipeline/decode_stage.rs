//! Decode stage: classify, decode, convert, publish
//!
//! Runs entirely inside the capture collaborator's callback invocations.
//! Each access unit is classified, gated on stream synchronization, fed to
//! the decoder engine, and every frame the engine yields is converted to
//! the fixed output geometry and published to the handoff queue. All
//! per-unit failures are absorbed here; nothing in this stage can take the
//! pipeline down.

use log::{error, info, warn};
use std::sync::Arc;

use crate::capture::AccessUnitSink;
use crate::decoder::classifier::{AccessUnitClassifier, Classification};
use crate::decoder::convert::FrameConverter;
use crate::decoder::engine::DecoderEngine;
use crate::pipeline::handoff::{FrameProducer, PushOutcome};
use crate::pipeline::health::PipelineHealth;
use crate::pipeline::types::PresentationFrame;

/// Conversion failures in a row before the per-frame warning escalates.
const SUSTAINED_CONVERT_FAILURES: u32 = 10;

/// The capture-context half of the pipeline.
///
/// Owns the classifier, the decoder engine, and the conversion context;
/// the presentation context never touches any of them. The only shared
/// structure is the handoff queue reached through `output`.
pub struct DecodeStage<D, C>
where
    D: DecoderEngine,
    C: FrameConverter<D::Frame>,
{
    classifier: AccessUnitClassifier,
    decoder: D,
    converter: C,
    output: FrameProducer<PresentationFrame>,
    health: Arc<PipelineHealth>,
    consecutive_convert_failures: u32,
}

impl<D, C> DecodeStage<D, C>
where
    D: DecoderEngine,
    C: FrameConverter<D::Frame>,
{
    pub fn new(
        decoder: D,
        converter: C,
        output: FrameProducer<PresentationFrame>,
        health: Arc<PipelineHealth>,
    ) -> Self {
        Self {
            classifier: AccessUnitClassifier::new(Arc::clone(&health)),
            decoder,
            converter,
            output,
            health,
            consecutive_convert_failures: 0,
        }
    }

    /// Ingest one access unit. This is the pipeline's entry point, called
    /// once per unit by the capture adapter; the borrow ends when it
    /// returns.
    pub fn ingest(&mut self, unit: &[u8]) {
        match self.classifier.classify(unit) {
            Classification::Skip => {}
            Classification::StartDecode | Classification::ContinueDecode => self.process(unit),
        }
    }

    fn process(&mut self, unit: &[u8]) {
        self.health.record_ingest(unit.len());

        if let Err(e) = self.decoder.submit(unit) {
            warn!(
                "decoder rejected access unit ({} bytes), dropping it: {:#}",
                unit.len(),
                e
            );
            self.health.record_decode_failure();
            return;
        }

        loop {
            match self.decoder.drain_next() {
                Ok(Some(frame)) => self.publish(&frame),
                Ok(None) => break,
                Err(e) => {
                    warn!("decoder drain failed, abandoning unit: {:#}", e);
                    self.health.record_decode_failure();
                    break;
                }
            }
        }
    }

    fn publish(&mut self, frame: &D::Frame) {
        let converted = match self.converter.convert(frame) {
            Ok(converted) => converted,
            Err(e) => {
                self.health.record_convert_failure();
                self.consecutive_convert_failures += 1;
                if self.consecutive_convert_failures >= SUSTAINED_CONVERT_FAILURES {
                    error!(
                        "conversion failing persistently ({} frames in a row): {:#}",
                        self.consecutive_convert_failures, e
                    );
                } else {
                    warn!("conversion failed, skipping frame: {:#}", e);
                }
                return;
            }
        };
        self.consecutive_convert_failures = 0;

        // Ownership moves into the queue; the buffers are not touched again
        match self.output.push(converted) {
            PushOutcome::Queued => self.health.record_frame_published(),
            PushOutcome::DroppedOldest => {
                self.health.record_frame_published();
                self.health.record_queue_drop();
                info!("presentation is behind, evicted oldest queued frame");
            }
            PushOutcome::Rejected => {
                self.health.record_queue_drop();
            }
        }
    }
}

impl<D, C> AccessUnitSink for DecodeStage<D, C>
where
    D: DecoderEngine,
    C: FrameConverter<D::Frame>,
{
    fn on_access_unit(&mut self, unit: &[u8]) {
        self.ingest(unit)
    }
}
