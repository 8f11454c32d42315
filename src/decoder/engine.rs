//! H.264 decoding via FFmpeg

use ac_ffmpeg::codec::Decoder;
use ac_ffmpeg::codec::video::{VideoDecoder, VideoFrame};
use ac_ffmpeg::packet::PacketMut;
use ac_ffmpeg::time::{TimeBase, Timestamp};
use anyhow::{Result, anyhow};

/// Decoder collaborator: accepts one compressed access unit at a time and
/// yields zero or more decoded frames for it.
///
/// Implementations are driven from the capture context only; a submit is
/// always followed by draining until `Ok(None)` before the next submit.
pub trait DecoderEngine: Send {
    /// Native decoded frame type, consumed by a matching [`FrameConverter`].
    ///
    /// [`FrameConverter`]: crate::decoder::convert::FrameConverter
    type Frame;

    /// Hand one access unit to the decoder. An error means the unit was
    /// rejected; the pipeline drops it and continues.
    fn submit(&mut self, unit: &[u8]) -> Result<()>;

    /// Pull the next decoded frame, or `Ok(None)` when the decoder has
    /// nothing more ready for the units submitted so far.
    fn drain_next(&mut self) -> Result<Option<Self::Frame>>;
}

/// H.264 video decoder using FFmpeg.
///
/// Packets carry a synthetic monotonic PTS on a 90 kHz time base; the
/// capture stream has no container timestamps of its own.
pub struct FfmpegDecoder {
    decoder: VideoDecoder,
    frame_count: i64,
}

unsafe impl Send for FfmpegDecoder {}

impl FfmpegDecoder {
    pub fn new() -> Result<Self> {
        // Low-delay single-threaded decode: frames come out as soon as the
        // live stream provides them, with no lookahead buffering
        let decoder = VideoDecoder::builder("h264")
            .map_err(|e| anyhow!("h264 decoder unavailable: {}", e))?
            .set_option("flags", "+low_delay")
            .set_option("flags2", "+fast")
            .set_option("threads", "1")
            .time_base(TimeBase::new(1, 90_000))
            .build()
            .map_err(|e| anyhow!("failed to open h264 decoder: {}", e))?;

        Ok(Self {
            decoder,
            frame_count: 0,
        })
    }

    fn next_pts(&mut self) -> Timestamp {
        self.frame_count += 1;
        Timestamp::new(self.frame_count, TimeBase::new(1, 90_000))
    }
}

impl DecoderEngine for FfmpegDecoder {
    type Frame = VideoFrame;

    fn submit(&mut self, unit: &[u8]) -> Result<()> {
        let pts = self.next_pts();
        let packet = PacketMut::from(unit).with_pts(pts).freeze();

        self.decoder
            .try_push(packet)
            .map_err(|e| anyhow!("decoder rejected packet: {}", e))
    }

    fn drain_next(&mut self) -> Result<Option<VideoFrame>> {
        self.decoder
            .take()
            .map_err(|e| anyhow!("decoder drain failed: {}", e))
    }
}
