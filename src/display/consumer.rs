//! Presentation consumer run-loop
//!
//! Runs on the context that owns the window and renderer. Blocks on the
//! handoff queue, renders each frame it receives, and releases the frame
//! afterwards — the terminal point of every frame's ownership chain.

use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;

use crate::display::surface::PresentationSurface;
use crate::pipeline::handoff::FrameConsumer;
use crate::pipeline::health::PipelineHealth;
use crate::pipeline::types::PresentationFrame;

/// How many presented frames between health summaries in the log.
const SUMMARY_INTERVAL_FRAMES: u64 = 300;

pub struct PresentationConsumer<S: PresentationSurface> {
    frames: FrameConsumer<PresentationFrame>,
    surface: S,
    health: Arc<PipelineHealth>,
}

impl<S: PresentationSurface> PresentationConsumer<S> {
    pub fn new(
        frames: FrameConsumer<PresentationFrame>,
        surface: S,
        health: Arc<PipelineHealth>,
    ) -> Self {
        Self {
            frames,
            surface,
            health,
        }
    }

    /// Drain the handoff queue until the stream ends or a stop is
    /// signalled. Surface errors skip the frame and keep the loop alive.
    pub fn run(&mut self) -> Result<()> {
        info!("presentation loop started");
        let mut presented = 0u64;

        while let Some(frame) = self.frames.pop() {
            match self.render(&frame) {
                Ok(()) => {
                    self.health.record_frame_presented();
                    presented += 1;
                    if presented % SUMMARY_INTERVAL_FRAMES == 0 {
                        info!("{}", self.health.summary());
                    }
                }
                Err(e) => warn!("presentation failed, skipping frame: {:#}", e),
            }
            // The frame drops here: its buffers are released
        }

        info!("presentation loop finished ({} frames)", presented);
        Ok(())
    }

    fn render(&mut self, frame: &PresentationFrame) -> Result<()> {
        self.surface.upload(frame)?;
        self.surface.clear()?;
        self.surface.draw()?;
        self.surface.present()?;
        Ok(())
    }
}
