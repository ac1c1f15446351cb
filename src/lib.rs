// Core modules
pub mod camera;
pub mod cli;
pub mod common;
pub mod serial;
pub mod storage;
pub mod watch;

// Re-export commonly used types
pub use camera::{Camera, FrameSource, StubCamera};
pub use common::{Config, DevMode, Result, SentryError};
pub use serial::{LineSource, ScriptedLines, SerialLink};
pub use storage::CaptureStore;
pub use watch::{Sentry, WatchEvent};
