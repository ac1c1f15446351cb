pub mod v4l2;

pub use v4l2::Camera;

use crate::common::{Result, SentryError};
use image::{DynamicImage, ImageBuffer, Rgb};

/// A source of still frames.
///
/// The watch loop asks for exactly one frame per detection event; sources
/// report capture failures as errors and stay usable afterwards.
pub trait FrameSource {
    fn capture_frame(&mut self) -> Result<DynamicImage>;
}

/// Synthetic frame source for tests and dry runs.
///
/// Produces a deterministic RGB pattern that varies per frame; construct with
/// `failing()` to simulate a camera whose captures always fail.
pub struct StubCamera {
    width: u32,
    height: u32,
    frame_count: u64,
    fail: bool,
}

impl StubCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_count: 0,
            fail: false,
        }
    }

    pub fn failing(width: u32, height: u32) -> Self {
        Self {
            fail: true,
            ..Self::new(width, height)
        }
    }
}

impl FrameSource for StubCamera {
    fn capture_frame(&mut self) -> Result<DynamicImage> {
        if self.fail {
            return Err(SentryError::Capture("stub capture failure".into()));
        }
        self.frame_count += 1;

        let pixel_count = (self.width * self.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count) % 256) as u8;
        }

        let buffer = ImageBuffer::<Rgb<u8>, _>::from_raw(self.width, self.height, pixels)
            .ok_or_else(|| SentryError::Capture("stub frame buffer size mismatch".into()))?;
        Ok(DynamicImage::ImageRgb8(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_camera_produces_frames() {
        let mut camera = StubCamera::new(64, 48);
        let frame = camera.capture_frame().unwrap();
        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
    }

    #[test]
    fn failing_stub_reports_capture_error() {
        let mut camera = StubCamera::failing(64, 48);
        assert!(matches!(
            camera.capture_frame(),
            Err(SentryError::Capture(_))
        ));
    }
}
