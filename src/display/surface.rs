//! Presentation surface interface

use anyhow::Result;

use crate::pipeline::types::PresentationFrame;

/// The window/renderer/streaming-texture collaborator.
///
/// The presentation consumer is the only caller; no other component or
/// thread may touch an implementation's mutable state. One render pass is
/// `upload`, `clear`, `draw`, `present`, in that order.
pub trait PresentationSurface {
    /// Copy the frame's three planes (with their row strides) into the
    /// streaming texture. The frame is only borrowed for the call.
    fn upload(&mut self, frame: &PresentationFrame) -> Result<()>;

    /// Clear the render target.
    fn clear(&mut self) -> Result<()>;

    /// Draw the streaming texture to fill the surface.
    fn draw(&mut self) -> Result<()>;

    /// Flip the rendered frame to the screen.
    fn present(&mut self) -> Result<()>;
}
