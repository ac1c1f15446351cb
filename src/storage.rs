use crate::common::{DevMode, Result, SentryError, StorageConfig};
use image::DynamicImage;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Writes captured frames as timestamped JPEGs.
///
/// One detection event yields at most one file; files are never mutated or
/// deleted afterwards.
pub struct CaptureStore {
    output_dir: PathBuf,
    file_prefix: String,
    jpeg_quality: u8,
}

impl CaptureStore {
    pub fn new_with_dev_mode(config: &StorageConfig, dev_mode: &DevMode) -> Result<Self> {
        let output_dir = if dev_mode.is_enabled() {
            dev_mode.captures_dir()
        } else {
            config.output_dir.clone()
        };
        Self::new_with_dir(output_dir, config)
    }

    pub fn new_with_dir(output_dir: PathBuf, config: &StorageConfig) -> Result<Self> {
        fs::create_dir_all(&output_dir)?;

        Ok(Self {
            output_dir,
            file_prefix: config.file_prefix.clone(),
            jpeg_quality: config.jpeg_quality,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Encode the frame as JPEG and write it under a timestamp-derived name.
    pub fn save_frame(&self, frame: &DynamicImage) -> Result<PathBuf> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .output_dir
            .join(format!("{}_{}.jpg", self.file_prefix, timestamp));

        let file = fs::File::create(&path)
            .map_err(|e| SentryError::Storage(format!("Failed to create {}: {}", path.display(), e)))?;
        let mut writer = BufWriter::new(file);
        frame
            .write_to(&mut writer, image::ImageOutputFormat::Jpeg(self.jpeg_quality))
            .map_err(|e| SentryError::Storage(format!("Failed to encode {}: {}", path.display(), e)))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{FrameSource, StubCamera};

    fn test_store(dir: &Path) -> CaptureStore {
        CaptureStore::new_with_dir(dir.to_path_buf(), &StorageConfig::default()).unwrap()
    }

    #[test]
    fn save_frame_writes_one_timestamped_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        let frame = StubCamera::new(64, 48).capture_frame().unwrap();
        let path = store.save_frame(&frame).unwrap();

        assert!(path.exists());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("intruder_"));
        assert!(name.ends_with(".jpg"));
        // intruder_YYYYMMDD_HHMMSS.jpg
        assert_eq!(name.len(), "intruder_".len() + 15 + ".jpg".len());

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn save_frame_honors_custom_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            file_prefix: "porch".to_string(),
            ..StorageConfig::default()
        };
        let store = CaptureStore::new_with_dir(dir.path().to_path_buf(), &config).unwrap();

        let frame = StubCamera::new(32, 32).capture_frame().unwrap();
        let path = store.save_frame(&frame).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("porch_"));
    }

    #[test]
    fn saved_file_is_valid_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        let frame = StubCamera::new(64, 48).capture_frame().unwrap();
        let path = store.save_frame(&frame).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn store_creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("captures").join("porch");
        let store = test_store(&nested);
        assert!(store.output_dir().exists());
    }
}
