use crate::camera::FrameSource;
use crate::common::{CameraConfig, Result, SentryError};
use image::{DynamicImage, ImageBuffer, Luma, Rgb};
use std::fs;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

pub struct Camera {
    device: Device,
    config: CameraConfig,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Result<Self> {
        tracing::info!("Opening camera device {}...", config.device_index);

        let device = Device::new(config.device_index as usize).map_err(|e| {
            SentryError::Camera(format!(
                "Failed to open camera {}: {}",
                config.device_index, e
            ))
        })?;

        let caps = device
            .query_caps()
            .map_err(|e| SentryError::Camera(format!("Failed to query capabilities: {}", e)))?;

        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            // Some devices report only metadata capture but still stream; warn and continue.
            tracing::warn!(
                "Device {} may not support standard video capture: {:?}",
                config.device_index,
                caps.capabilities
            );
        }

        let mut fmt = device
            .format()
            .map_err(|e| SentryError::Camera(format!("Failed to get format: {}", e)))?;

        tracing::debug!(
            "Current format: {}x{} {}",
            fmt.width,
            fmt.height,
            fmt.fourcc.str().unwrap_or("????")
        );

        fmt.width = config.width;
        fmt.height = config.height;

        // Keep GREY for mono/IR devices, otherwise ask for MJPG
        if fmt.fourcc.repr != *b"GREY" {
            fmt.fourcc = FourCC::new(b"MJPG");
        }

        // Try to set the format, but don't fail if the device can't honor it exactly
        match device.set_format(&fmt) {
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not set exact format: {}. Using device defaults.", e),
        }

        let final_fmt = device
            .format()
            .map_err(|e| SentryError::Camera(format!("Failed to get final format: {}", e)))?;

        tracing::info!(
            "Camera {} ready: {}x{} {}",
            config.device_index,
            final_fmt.width,
            final_fmt.height,
            final_fmt.fourcc.str().unwrap_or("????")
        );

        if final_fmt.width != config.width || final_fmt.height != config.height {
            tracing::warn!(
                "Camera resolution {}x{} differs from requested {}x{}",
                final_fmt.width,
                final_fmt.height,
                config.width,
                config.height
            );
        }

        Ok(Self {
            device,
            config: config.clone(),
        })
    }

    /// List all available cameras with their capabilities and pixel formats.
    pub fn list_all_cameras() -> Result<Vec<(u32, String, Vec<String>)>> {
        let mut cameras = Vec::new();

        for entry in fs::read_dir("/dev")? {
            let entry = entry?;
            let path = entry.path();
            let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            let Some(index_str) = filename.strip_prefix("video") else {
                continue;
            };
            let Ok(index) = index_str.parse::<u32>() else {
                continue;
            };

            let Ok(device) = Device::new(index as usize) else {
                continue;
            };
            let Ok(caps) = device.query_caps() else {
                continue;
            };

            let mut features = Vec::new();
            if caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE)
            {
                features.push("VIDEO_CAPTURE".to_string());
            }

            let formats = device.enum_formats().unwrap_or_default();
            for fmt in &formats {
                let fourcc_str = fmt.fourcc.str().unwrap_or("UNKNOWN");
                match &fmt.fourcc.repr {
                    b"GREY" | b"Y8  " | b"Y16 " => {
                        features.push(format!("Grayscale ({})", fourcc_str))
                    }
                    b"MJPG" | b"YUYV" => features.push(format!("Color ({})", fourcc_str)),
                    _ => {}
                }
            }

            cameras.push((index, caps.card.clone(), features));
        }

        cameras.sort_by_key(|c| c.0);
        Ok(cameras)
    }

    pub fn capture_frame(&mut self) -> Result<DynamicImage> {
        let fmt = self
            .device
            .format()
            .map_err(|e| SentryError::Camera(format!("Failed to get format: {}", e)))?;

        let mut stream =
            v4l::io::mmap::Stream::with_buffers(&mut self.device, Type::VideoCapture, 4)
                .map_err(|e| SentryError::Capture(format!("Failed to create stream: {}", e)))?;

        // Warmup frames so auto-exposure settles
        for _ in 0..self.config.warmup_frames {
            let (_buf, _meta) = stream
                .next()
                .map_err(|e| SentryError::Capture(format!("Failed to capture warmup frame: {}", e)))?;
            std::thread::sleep(std::time::Duration::from_millis(self.config.warmup_delay_ms));
        }

        let (buf, _meta) = stream
            .next()
            .map_err(|e| SentryError::Capture(format!("Failed to capture: {}", e)))?;

        decode_frame(buf, &fmt.fourcc, fmt.width, fmt.height)
    }
}

impl FrameSource for Camera {
    fn capture_frame(&mut self) -> Result<DynamicImage> {
        Camera::capture_frame(self)
    }
}

fn decode_frame(data: &[u8], fourcc: &FourCC, width: u32, height: u32) -> Result<DynamicImage> {
    match &fourcc.repr {
        b"GREY" => grey_to_image(data, width, height),
        b"MJPG" => image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
            .map_err(|e| SentryError::Capture(format!("Failed to decode MJPG frame: {}", e))),
        b"YUYV" => yuyv_to_image(data, width, height),
        _ => Err(SentryError::Capture(format!(
            "Unsupported pixel format: {}",
            fourcc.str().unwrap_or("????")
        ))),
    }
}

fn grey_to_image(data: &[u8], width: u32, height: u32) -> Result<DynamicImage> {
    let buffer = ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data.to_vec())
        .ok_or_else(|| SentryError::Capture("Failed to create grayscale image buffer".into()))?;
    Ok(DynamicImage::ImageLuma8(buffer))
}

fn yuyv_to_image(data: &[u8], width: u32, height: u32) -> Result<DynamicImage> {
    let expected = (width * height * 2) as usize;
    if data.len() < expected {
        return Err(SentryError::Capture(format!(
            "Short YUYV frame: got {} bytes, expected {}",
            data.len(),
            expected
        )));
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for chunk in data[..expected].chunks_exact(4) {
        let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
        rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
        rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
    }

    let buffer = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, rgb)
        .ok_or_else(|| SentryError::Capture("Failed to create RGB image buffer".into()))?;
    Ok(DynamicImage::ImageRgb8(buffer))
}

// BT.601 integer conversion
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let r = (298 * c + 409 * e + 128) >> 8;
    let g = (298 * c - 100 * d - 208 * e + 128) >> 8;
    let b = (298 * c + 516 * d + 128) >> 8;
    [
        r.clamp(0, 255) as u8,
        g.clamp(0, 255) as u8,
        b.clamp(0, 255) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_failure_is_an_error_not_a_panic() {
        // Device indices this high don't exist on any sane system; opening
        // one must fail up front so the caller can abort before its loop.
        let config = CameraConfig {
            device_index: 250,
            ..CameraConfig::default()
        };
        assert!(matches!(Camera::new(&config), Err(SentryError::Camera(_))));
    }

    #[test]
    fn yuyv_decodes_to_full_resolution_rgb() {
        // 2x2 frame: 4 pixels, 2 bytes each
        let data = [128u8, 128, 128, 128, 128, 128, 128, 128];
        let img = yuyv_to_image(&data, 2, 2).unwrap();
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 2);
    }

    #[test]
    fn yuyv_rejects_short_buffers() {
        let data = [0u8; 4];
        assert!(yuyv_to_image(&data, 2, 2).is_err());
    }

    #[test]
    fn grey_rejects_wrong_buffer_size() {
        let data = [0u8; 3];
        assert!(grey_to_image(&data, 2, 2).is_err());
    }

    #[test]
    fn yuv_conversion_stays_in_range() {
        // Extremes must clamp, not wrap
        assert_eq!(yuv_to_rgb(255, 255, 255)[0], 255);
        assert_eq!(yuv_to_rgb(0, 0, 0)[2], 0);
    }
}
