//! Headless presentation surface
//!
//! Stands in for a real window when none is wanted: validates every
//! uploaded frame against the session geometry and reports presentation
//! pace in the log instead of on screen.

use anyhow::{Result, ensure};
use log::info;
use std::time::Instant;

use crate::display::surface::PresentationSurface;
use crate::pipeline::types::{PresentationFrame, VideoGeometry};

/// How many presents between pace log lines.
const LOG_INTERVAL_FRAMES: u64 = 30;

pub struct HeadlessSurface {
    geometry: VideoGeometry,
    uploaded: bool,
    presented: u64,
    window_started: Instant,
}

impl HeadlessSurface {
    pub fn new(geometry: VideoGeometry) -> Self {
        Self {
            geometry,
            uploaded: false,
            presented: 0,
            window_started: Instant::now(),
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl PresentationSurface for HeadlessSurface {
    fn upload(&mut self, frame: &PresentationFrame) -> Result<()> {
        ensure!(
            frame.geometry == self.geometry,
            "frame geometry {} does not match surface geometry {}",
            frame.geometry,
            self.geometry
        );
        ensure!(frame.planes_valid(), "frame planes do not match geometry");
        self.uploaded = true;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        ensure!(self.uploaded, "draw before first upload");
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.presented += 1;
        if self.presented % LOG_INTERVAL_FRAMES == 0 {
            let elapsed = self.window_started.elapsed().as_secs_f64();
            let fps = if elapsed > 0.0 {
                LOG_INTERVAL_FRAMES as f64 / elapsed
            } else {
                0.0
            };
            info!("presented frame {} ({:.1} fps)", self.presented, fps);
            self.window_started = Instant::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(geometry: VideoGeometry) -> PresentationFrame {
        PresentationFrame::from_planes(
            geometry,
            vec![0; geometry.y_plane_len()],
            vec![0; geometry.uv_plane_len()],
            vec![0; geometry.uv_plane_len()],
        )
        .unwrap()
    }

    #[test]
    fn test_accepts_matching_geometry() {
        let geometry = VideoGeometry::new(64, 48).unwrap();
        let mut surface = HeadlessSurface::new(geometry);

        surface.upload(&frame(geometry)).unwrap();
        surface.clear().unwrap();
        surface.draw().unwrap();
        surface.present().unwrap();
        assert_eq!(surface.presented(), 1);
    }

    #[test]
    fn test_rejects_wrong_geometry() {
        let mut surface = HeadlessSurface::new(VideoGeometry::new(64, 48).unwrap());
        let wrong = frame(VideoGeometry::new(32, 32).unwrap());

        assert!(surface.upload(&wrong).is_err());
    }

    #[test]
    fn test_draw_requires_an_upload() {
        let mut surface = HeadlessSurface::new(VideoGeometry::new(64, 48).unwrap());
        assert!(surface.draw().is_err());
    }
}
