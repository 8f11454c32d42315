//! Video decoding module
//!
//! Classifies incoming access units, decodes them via FFmpeg, and converts
//! the result to the fixed output geometry.

pub mod classifier;
pub mod convert;
pub mod engine;

pub use classifier::{AccessUnitClassifier, Classification};
pub use convert::{FfmpegScaler, FrameConverter};
pub use engine::{DecoderEngine, FfmpegDecoder};
