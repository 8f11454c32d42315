//! Core types for the frame pipeline

use anyhow::{Result, ensure};

/// Fixed output geometry of the pipeline, constant for a session.
///
/// Both dimensions must be even: the output is 4:2:0 planar, so the
/// chroma planes are sampled at half resolution in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoGeometry {
    pub width: u32,
    pub height: u32,
}

impl VideoGeometry {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        ensure!(width > 0 && height > 0, "geometry must be non-zero");
        ensure!(
            width % 2 == 0 && height % 2 == 0,
            "geometry must have even dimensions for 4:2:0 output, got {}x{}",
            width,
            height
        );
        Ok(Self { width, height })
    }

    /// Width of the U/V planes.
    pub fn chroma_width(&self) -> usize {
        self.width as usize / 2
    }

    /// Height of the U/V planes.
    pub fn chroma_height(&self) -> usize {
        self.height as usize / 2
    }

    /// Byte length of a tightly packed luma plane.
    pub fn y_plane_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Byte length of one tightly packed chroma plane.
    pub fn uv_plane_len(&self) -> usize {
        self.chroma_width() * self.chroma_height()
    }
}

impl std::fmt::Display for VideoGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A decoded, converted, display-ready frame: three planar buffers plus
/// their row strides.
///
/// The unit exchanged on the handoff queue. The decode stage creates it,
/// the queue carries it by value, and the presentation consumer owns it
/// from `pop` until it is dropped after upload. Moving the value is the
/// ownership transfer; no component keeps a reference past the move.
#[derive(Debug)]
pub struct PresentationFrame {
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
    pub y_stride: usize,
    pub uv_stride: usize,
    pub geometry: VideoGeometry,
}

impl PresentationFrame {
    /// Build a frame from tightly packed planes, validating that each
    /// plane is sized exactly for the output geometry.
    pub fn from_planes(
        geometry: VideoGeometry,
        y: Vec<u8>,
        u: Vec<u8>,
        v: Vec<u8>,
    ) -> Result<Self> {
        ensure!(
            y.len() == geometry.y_plane_len()
                && u.len() == geometry.uv_plane_len()
                && v.len() == geometry.uv_plane_len(),
            "plane sizes {}/{}/{} do not match output geometry {}",
            y.len(),
            u.len(),
            v.len(),
            geometry
        );

        Ok(Self {
            y_stride: geometry.width as usize,
            uv_stride: geometry.chroma_width(),
            y,
            u,
            v,
            geometry,
        })
    }

    /// Whether the planes and strides are consistent with the geometry.
    pub fn planes_valid(&self) -> bool {
        self.y_stride == self.geometry.width as usize
            && self.uv_stride == self.geometry.chroma_width()
            && self.y.len() == self.geometry.y_plane_len()
            && self.u.len() == self.geometry.uv_plane_len()
            && self.v.len() == self.geometry.uv_plane_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_plane_lengths() {
        let geometry = VideoGeometry::new(1280, 720).unwrap();

        assert_eq!(geometry.y_plane_len(), 1280 * 720);
        assert_eq!(geometry.chroma_width(), 640);
        assert_eq!(geometry.chroma_height(), 360);
        assert_eq!(geometry.uv_plane_len(), 640 * 360);
    }

    #[test]
    fn test_geometry_rejects_odd_or_zero() {
        assert!(VideoGeometry::new(0, 720).is_err());
        assert!(VideoGeometry::new(1280, 0).is_err());
        assert!(VideoGeometry::new(1279, 720).is_err());
        assert!(VideoGeometry::new(1280, 719).is_err());
    }

    #[test]
    fn test_frame_from_planes() {
        let geometry = VideoGeometry::new(64, 48).unwrap();
        let frame = PresentationFrame::from_planes(
            geometry,
            vec![0; geometry.y_plane_len()],
            vec![0; geometry.uv_plane_len()],
            vec![0; geometry.uv_plane_len()],
        )
        .unwrap();

        assert_eq!(frame.y_stride, 64);
        assert_eq!(frame.uv_stride, 32);
        assert!(frame.planes_valid());
    }

    #[test]
    fn test_frame_rejects_mis_sized_planes() {
        let geometry = VideoGeometry::new(64, 48).unwrap();
        let result = PresentationFrame::from_planes(
            geometry,
            vec![0; geometry.y_plane_len() - 1],
            vec![0; geometry.uv_plane_len()],
            vec![0; geometry.uv_plane_len()],
        );

        assert!(result.is_err());
    }
}
