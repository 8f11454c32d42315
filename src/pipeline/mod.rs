//! Cross-thread frame pipeline
//!
//! Wires the capture/decode context to the presentation context:
//! - Classification and decoding run inside the capture callbacks
//! - Decoded frames cross to the presentation context through a bounded
//!   handoff queue that never blocks the producer
//! - A session coordinator drives the lifecycle and guarantees every
//!   published frame is released exactly once, shutdown included

pub mod decode_stage;
pub mod handoff;
pub mod health;
pub mod session;
pub mod state;
pub mod types;

pub use decode_stage::DecodeStage;
pub use handoff::{FrameConsumer, FrameProducer, HandoffControl, PushOutcome};
pub use health::{HealthSummary, PipelineHealth};
pub use session::PipelineSession;
pub use state::PipelineState;
pub use types::{PresentationFrame, VideoGeometry};
