use std::path::PathBuf;

// Simple paths module - we primarily use DevMode for path management

pub fn system_config_file() -> PathBuf {
    PathBuf::from("/etc/sentrycam/sentry.toml")
}
