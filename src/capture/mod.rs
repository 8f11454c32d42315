//! Capture device module
//!
//! The capture collaborator owns the device session: it negotiates a
//! stream, then invokes the sink once per compressed access unit from its
//! own thread until stopped. Callbacks for one session are serialized —
//! never two in flight at once — and the sink must return promptly; the
//! pipeline guarantees it never blocks on the presentation side.

pub mod file;

pub use file::FileCaptureDevice;

use anyhow::Result;

/// Stream parameters requested from the device at start.
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            frame_rate: 30,
        }
    }
}

/// Receiver of compressed access units.
///
/// The unit is borrowed only for the duration of the call; implementations
/// must copy whatever they need before returning.
pub trait AccessUnitSink: Send {
    fn on_access_unit(&mut self, unit: &[u8]);
}

impl<F> AccessUnitSink for F
where
    F: FnMut(&[u8]) + Send,
{
    fn on_access_unit(&mut self, unit: &[u8]) {
        self(unit)
    }
}

/// A source of compressed access units with explicit start/stop control.
pub trait CaptureDevice {
    /// Begin streaming, delivering access units to `sink` from the
    /// device's own context until `stop` is called or the stream ends.
    fn start(&mut self, config: StreamConfig, sink: Box<dyn AccessUnitSink>) -> Result<()>;

    /// Halt the stream. After this returns no further callbacks are made.
    fn stop(&mut self) -> Result<()>;
}
