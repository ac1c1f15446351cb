use crate::common::error::{Result, SentryError};
use crate::common::paths::system_config_file;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Time to let the link establish after opening the port.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_trigger")]
    pub trigger: String,
}

fn default_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 9600 }
fn default_settle_delay() -> u64 { 2000 }
fn default_poll_interval() -> u64 { 50 }
fn default_read_timeout() -> u64 { 100 }
fn default_trigger() -> String { "Intruder detected!".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            settle_delay_ms: default_settle_delay(),
            poll_interval_ms: default_poll_interval(),
            read_timeout_ms: default_read_timeout(),
            trigger: default_trigger(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default)]
    pub device_index: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_warmup_frames")]
    pub warmup_frames: u32,
    #[serde(default = "default_warmup_delay")]
    pub warmup_delay_ms: u64,
}

fn default_width() -> u32 { 640 }
fn default_height() -> u32 { 480 }
fn default_warmup_frames() -> u32 { 3 }
fn default_warmup_delay() -> u64 { 50 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: default_width(),
            height: default_height(),
            warmup_frames: default_warmup_frames(),
            warmup_delay_ms: default_warmup_delay(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_output_dir() -> PathBuf { PathBuf::from(".") }
fn default_file_prefix() -> String { "intruder".to_string() }
fn default_jpeg_quality() -> u8 { 90 }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl Config {
    /// Load from `configs/sentry.toml`, then the system location, else
    /// fall back to built-in defaults so the tool runs unconfigured.
    pub fn load() -> Result<Self> {
        let local = Path::new("configs/sentry.toml");
        if local.exists() {
            return Self::load_from_path(local);
        }
        let system = system_config_file();
        if system.exists() {
            return Self::load_from_path(&system);
        }
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SentryError::Other(anyhow::anyhow!(
                "Config file not found: {}", path.display()
            )));
        }

        tracing::debug!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| SentryError::Other(anyhow::anyhow!("Config parse error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(SentryError::Other(anyhow::anyhow!(
                "Baud rate must be non-zero"
            )));
        }
        if self.serial.trigger.trim().is_empty() {
            return Err(SentryError::Other(anyhow::anyhow!(
                "Trigger string must not be empty"
            )));
        }
        if self.serial.poll_interval_ms == 0 {
            return Err(SentryError::Other(anyhow::anyhow!(
                "Poll interval must be at least 1 ms"
            )));
        }

        // Validate camera dimensions
        if self.camera.width == 0 || self.camera.width > 4096 {
            return Err(SentryError::Other(anyhow::anyhow!(
                "Camera width must be between 1 and 4096, got {}", self.camera.width
            )));
        }
        if self.camera.height == 0 || self.camera.height > 4096 {
            return Err(SentryError::Other(anyhow::anyhow!(
                "Camera height must be between 1 and 4096, got {}", self.camera.height
            )));
        }

        if self.storage.jpeg_quality == 0 || self.storage.jpeg_quality > 100 {
            return Err(SentryError::Other(anyhow::anyhow!(
                "JPEG quality must be between 1 and 100, got {}", self.storage.jpeg_quality
            )));
        }

        Ok(())
    }
}
