//! Color-space conversion to the fixed output geometry
//!
//! Decoded frames arrive at whatever geometry and pixel format the stream
//! negotiated; the presentation surface wants one fixed YUV420p geometry.
//! Each conversion allocates one fresh set of tightly packed plane buffers
//! which become a [`PresentationFrame`].

use ac_ffmpeg::codec::video::VideoFrame;
use ac_ffmpeg::codec::video::frame::{PixelFormat, get_pixel_format};
use ac_ffmpeg::codec::video::scaler::{Algorithm, VideoFrameScaler};
use anyhow::{Result, anyhow, ensure};

use crate::pipeline::types::{PresentationFrame, VideoGeometry};

/// Conversion collaborator: resample a decoded frame into the fixed output
/// format and resolution.
pub trait FrameConverter<F>: Send {
    fn convert(&mut self, frame: &F) -> Result<PresentationFrame>;
}

/// swscale-backed converter producing YUV420p at a fixed target geometry.
///
/// The scaling context depends on the source geometry, which is only known
/// once the first frame is decoded; it is built lazily and rebuilt if the
/// source ever changes.
pub struct FfmpegScaler {
    target: VideoGeometry,
    scaler: Option<VideoFrameScaler>,
    source: Option<(usize, usize, PixelFormat)>,
}

unsafe impl Send for FfmpegScaler {}

impl FfmpegScaler {
    pub fn new(target: VideoGeometry) -> Self {
        Self {
            target,
            scaler: None,
            source: None,
        }
    }

    fn scaler_for(&mut self, frame: &VideoFrame) -> Result<&mut VideoFrameScaler> {
        let source = (frame.width(), frame.height(), frame.pixel_format());

        if self.scaler.is_none() || self.source != Some(source) {
            let (width, height, pixel_format) = source;
            let scaler = VideoFrameScaler::builder()
                .source_pixel_format(pixel_format)
                .source_width(width)
                .source_height(height)
                .target_pixel_format(get_pixel_format("yuv420p"))
                .target_width(self.target.width as usize)
                .target_height(self.target.height as usize)
                .algorithm(Algorithm::Bilinear)
                .build()
                .map_err(|e| anyhow!("failed to create frame scaler: {}", e))?;

            self.scaler = Some(scaler);
            self.source = Some(source);
        }

        Ok(self.scaler.as_mut().unwrap())
    }
}

impl FrameConverter<VideoFrame> for FfmpegScaler {
    fn convert(&mut self, frame: &VideoFrame) -> Result<PresentationFrame> {
        let target = self.target;
        let scaled = self
            .scaler_for(frame)?
            .scale(frame)
            .map_err(|e| anyhow!("frame scaling failed: {}", e))?;

        let planes = scaled.planes();
        ensure!(planes.len() >= 3, "scaled frame is not planar");

        let y = copy_plane(
            planes[0].data(),
            planes[0].line_size(),
            target.width as usize,
            target.height as usize,
        )?;
        let u = copy_plane(
            planes[1].data(),
            planes[1].line_size(),
            target.chroma_width(),
            target.chroma_height(),
        )?;
        let v = copy_plane(
            planes[2].data(),
            planes[2].line_size(),
            target.chroma_width(),
            target.chroma_height(),
        )?;

        PresentationFrame::from_planes(target, y, u, v)
    }
}

/// Copy one plane from a possibly stride-padded source into a fresh,
/// tightly packed buffer.
fn copy_plane(src: &[u8], stride: usize, width: usize, height: usize) -> Result<Vec<u8>> {
    let tight = width * height;

    // Fast path: no stride padding
    if stride == width && src.len() >= tight {
        return Ok(src[..tight].to_vec());
    }

    ensure!(
        stride >= width && src.len() >= stride * (height - 1) + width,
        "source plane too small: {} bytes for {}x{} at stride {}",
        src.len(),
        width,
        height,
        stride
    );

    let mut out = Vec::with_capacity(tight);
    for row in src.chunks(stride).take(height) {
        out.extend_from_slice(&row[..width]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_plane_tight_source() {
        let src: Vec<u8> = (0..12).collect();
        let plane = copy_plane(&src, 4, 4, 3).unwrap();
        assert_eq!(plane, src);
    }

    #[test]
    fn test_copy_plane_strips_padding() {
        // 3 rows of width 4, stride 6: two padding bytes per row
        let mut src = Vec::new();
        for row in 0..3u8 {
            src.extend_from_slice(&[row; 4]);
            src.extend_from_slice(&[0xEE, 0xEE]);
        }

        let plane = copy_plane(&src, 6, 4, 3).unwrap();
        assert_eq!(plane.len(), 12);
        assert_eq!(&plane[..4], &[0; 4]);
        assert_eq!(&plane[4..8], &[1; 4]);
        assert_eq!(&plane[8..], &[2; 4]);
    }

    #[test]
    fn test_copy_plane_rejects_short_source() {
        let src = vec![0u8; 10];
        assert!(copy_plane(&src, 6, 4, 3).is_err());
    }
}
