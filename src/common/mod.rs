pub mod config;
pub mod dev_mode;
pub mod error;
pub mod paths;

pub use config::{CameraConfig, Config, SerialConfig, StorageConfig};
pub use dev_mode::DevMode;
pub use error::{Result, SentryError};
pub use paths::system_config_file;
