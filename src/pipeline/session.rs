//! Pipeline session coordinator
//!
//! Owns the capture device and the handoff queue's control handle, and
//! walks the session through its state machine. Stopping is ordered: the
//! device is halted first so no further callbacks arrive, then the queue
//! is stopped to release the blocked consumer, then every undelivered
//! frame is drained and released. The drain runs even when the device
//! fails to stop cleanly, so no shutdown path leaks frames.

use anyhow::{Context, Result, ensure};
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::capture::{AccessUnitSink, CaptureDevice, StreamConfig};
use crate::pipeline::handoff::HandoffControl;
use crate::pipeline::health::PipelineHealth;
use crate::pipeline::state::PipelineState;
use crate::pipeline::types::PresentationFrame;

pub struct PipelineSession<Dev: CaptureDevice> {
    device: Dev,
    control: HandoffControl<PresentationFrame>,
    health: Arc<PipelineHealth>,
    state: PipelineState,
}

impl<Dev: CaptureDevice> PipelineSession<Dev> {
    pub fn new(
        device: Dev,
        control: HandoffControl<PresentationFrame>,
        health: Arc<PipelineHealth>,
    ) -> Self {
        Self {
            device,
            control,
            health,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn health(&self) -> &Arc<PipelineHealth> {
        &self.health
    }

    /// Start streaming: hand the sink to the capture device and enter
    /// the `Streaming` state.
    pub fn start(&mut self, config: StreamConfig, sink: Box<dyn AccessUnitSink>) -> Result<()> {
        let next = PipelineState::Streaming {
            started_at: Instant::now(),
        };
        ensure!(
            self.state.can_transition_to(&next),
            "cannot start a session in state {}",
            self.state
        );

        self.device
            .start(config, sink)
            .context("failed to start capture device")?;

        self.state = next;
        info!(
            "session streaming at {} fps (requested {}x{})",
            config.frame_rate, config.width, config.height
        );
        Ok(())
    }

    /// Stop the session: halt capture callbacks, wake the consumer, and
    /// release every undelivered frame. Idempotent; safe to call from a
    /// signal handler thread and again after the run-loop returns.
    pub fn stop(&mut self) -> Result<()> {
        if self.state.is_idle() {
            return Ok(());
        }

        if let Some(duration) = self.state.streaming_duration() {
            info!("stopping session after {:.1}s", duration.as_secs_f64());
        }
        self.state = PipelineState::Stopping;

        let device_result = self.device.stop();
        if device_result.is_err() {
            warn!("capture device did not stop cleanly, draining anyway");
        }

        self.control.stop();
        let released = self.control.drain();
        if released > 0 {
            info!("released {} undelivered frames at shutdown", released);
        }
        info!("session stopped: {}", self.health.summary());

        self.state = PipelineState::Idle;
        device_result.context("capture device failed to stop")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::handoff::{self, FrameConsumer, FrameProducer};
    use crate::pipeline::types::VideoGeometry;
    use anyhow::anyhow;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type SharedSink = Arc<Mutex<Option<Box<dyn AccessUnitSink>>>>;

    /// Device double that exposes the sink so tests can drive callbacks.
    struct MockDevice {
        sink: SharedSink,
        stop_calls: Arc<AtomicUsize>,
        fail_stop: bool,
    }

    impl MockDevice {
        fn new() -> (Self, SharedSink, Arc<AtomicUsize>) {
            let sink: SharedSink = Arc::new(Mutex::new(None));
            let stop_calls = Arc::new(AtomicUsize::new(0));
            let device = Self {
                sink: Arc::clone(&sink),
                stop_calls: Arc::clone(&stop_calls),
                fail_stop: false,
            };
            (device, sink, stop_calls)
        }
    }

    impl CaptureDevice for MockDevice {
        fn start(&mut self, _config: StreamConfig, sink: Box<dyn AccessUnitSink>) -> Result<()> {
            *self.sink.lock().unwrap() = Some(sink);
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
            *self.sink.lock().unwrap() = None;
            if self.fail_stop {
                Err(anyhow!("device wedged"))
            } else {
                Ok(())
            }
        }
    }

    fn blank_frame() -> PresentationFrame {
        let geometry = VideoGeometry::new(16, 16).unwrap();
        PresentationFrame::from_planes(
            geometry,
            vec![0; geometry.y_plane_len()],
            vec![0; geometry.uv_plane_len()],
            vec![0; geometry.uv_plane_len()],
        )
        .unwrap()
    }

    /// A sink that publishes one blank frame per access unit.
    fn publishing_sink(producer: FrameProducer<PresentationFrame>) -> Box<dyn AccessUnitSink> {
        Box::new(move |_unit: &[u8]| {
            producer.push(blank_frame());
        })
    }

    fn session(
        device: MockDevice,
    ) -> (
        PipelineSession<MockDevice>,
        FrameProducer<PresentationFrame>,
        FrameConsumer<PresentationFrame>,
    ) {
        let (producer, consumer) = handoff::bounded(8);
        let session = PipelineSession::new(
            device,
            consumer.control(),
            Arc::new(PipelineHealth::new()),
        );
        (session, producer, consumer)
    }

    #[test]
    fn test_start_transitions_to_streaming() {
        let (device, sink, _stops) = MockDevice::new();
        let (mut session, producer, _consumer) = session(device);

        assert!(session.state().is_idle());
        session
            .start(StreamConfig::default(), publishing_sink(producer))
            .unwrap();
        assert!(session.state().is_streaming());
        assert!(sink.lock().unwrap().is_some());

        // A second start while streaming is rejected
        let (spare_producer, _spare_consumer) = handoff::bounded(1);
        assert!(
            session
                .start(StreamConfig::default(), publishing_sink(spare_producer))
                .is_err()
        );
    }

    #[test]
    fn test_stop_drains_queued_frames() {
        let (device, sink, stops) = MockDevice::new();
        let (mut session, producer, mut consumer) = session(device);
        let control = consumer.control();

        session
            .start(StreamConfig::default(), publishing_sink(producer))
            .unwrap();

        // Deliver three access units; each publishes a frame
        {
            let mut sink = sink.lock().unwrap();
            let sink = sink.as_mut().unwrap();
            for _ in 0..3 {
                sink.on_access_unit(&[0, 0, 0, 1, 5]);
            }
        }
        assert_eq!(control.queued(), 3);

        session.stop().unwrap();

        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(session.state().is_idle());
        // Queued frames were withheld from the consumer and released
        assert!(consumer.pop().is_none());
        assert_eq!(control.queued(), 0);

        // Stop is idempotent and does not touch the device again
        session.stop().unwrap();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_drains_even_when_device_fails() {
        let (mut device, sink, _stops) = MockDevice::new();
        device.fail_stop = true;
        let (mut session, producer, consumer) = session(device);
        let control = consumer.control();

        session
            .start(StreamConfig::default(), publishing_sink(producer))
            .unwrap();
        sink.lock()
            .unwrap()
            .as_mut()
            .unwrap()
            .on_access_unit(&[0, 0, 0, 1, 5]);
        assert_eq!(control.queued(), 1);

        // The device error propagates, but the drain still ran
        assert!(session.stop().is_err());
        assert_eq!(control.queued(), 0);
        assert!(control.is_stopped());
        assert!(session.state().is_idle());
    }
}
