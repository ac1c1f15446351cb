use crate::camera::FrameSource;
use crate::cli::keys;
use crate::common::{Config, Result};
use crate::serial::LineSource;
use crate::storage::CaptureStore;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one watch-loop iteration.
#[derive(Debug)]
pub enum WatchEvent {
    /// No complete line was pending on the serial link.
    Idle,
    /// A line arrived but did not match the trigger.
    Message(String),
    /// Trigger matched; the frame was captured and saved.
    Captured(PathBuf),
    /// Trigger matched but the capture or save failed.
    CaptureFailed,
}

/// The detection loop: polls the serial link and captures one frame per
/// intrusion report.
///
/// Owns the serial and camera handles exclusively; both are released when the
/// loop returns and the `Sentry` is dropped.
pub struct Sentry<S, C> {
    serial: S,
    camera: C,
    store: CaptureStore,
    trigger: String,
    poll_interval: Duration,
}

impl<S: LineSource, C: FrameSource> Sentry<S, C> {
    pub fn new(serial: S, camera: C, store: CaptureStore, config: &Config) -> Self {
        Self {
            serial,
            camera,
            store,
            trigger: config.serial.trigger.clone(),
            poll_interval: Duration::from_millis(config.serial.poll_interval_ms),
        }
    }

    /// One iteration: poll for a line, compare against the trigger, and on a
    /// match capture and save a single frame.
    ///
    /// Capture and save failures are reported and non-fatal; serial failures
    /// propagate.
    pub fn poll_once(&mut self) -> Result<WatchEvent> {
        let Some(line) = self.serial.poll_line()? else {
            return Ok(WatchEvent::Idle);
        };

        tracing::info!("Serial message: {}", line);

        if line != self.trigger {
            return Ok(WatchEvent::Message(line));
        }

        tracing::warn!("Intruder alert - capturing frame");
        let frame = match self.camera.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to capture frame: {}", e);
                return Ok(WatchEvent::CaptureFailed);
            }
        };

        match self.store.save_frame(&frame) {
            Ok(path) => {
                tracing::info!("Photo saved as {}", path.display());
                Ok(WatchEvent::Captured(path))
            }
            Err(e) => {
                tracing::error!("Failed to save frame: {}", e);
                Ok(WatchEvent::CaptureFailed)
            }
        }
    }

    /// Drive the loop until the quit key (`q` or Esc) is pressed.
    pub fn run(&mut self) -> Result<()> {
        let _guard = keys::TerminalGuard::enter();

        loop {
            self.poll_once()?;

            if keys::check_for_quit()? {
                tracing::info!("Quit requested");
                break;
            }

            std::thread::sleep(self.poll_interval);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::StubCamera;
    use crate::common::StorageConfig;
    use crate::serial::ScriptedLines;
    use std::fs;
    use std::path::Path;

    const TRIGGER: &str = "Intruder detected!";

    fn sentry_with<C: FrameSource>(
        lines: Vec<&str>,
        camera: C,
        dir: &Path,
    ) -> Sentry<ScriptedLines, C> {
        let config = Config::default();
        let store =
            CaptureStore::new_with_dir(dir.to_path_buf(), &StorageConfig::default()).unwrap();
        Sentry::new(ScriptedLines::new(lines), camera, store, &config)
    }

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn trigger_line_saves_exactly_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sentry = sentry_with(vec![TRIGGER], StubCamera::new(64, 48), dir.path());

        let event = sentry.poll_once().unwrap();
        let WatchEvent::Captured(path) = event else {
            panic!("expected capture, got {:?}", event);
        };
        assert!(path.exists());
        assert_eq!(file_count(dir.path()), 1);

        // Source drained; the loop goes idle.
        assert!(matches!(sentry.poll_once().unwrap(), WatchEvent::Idle));
        assert_eq!(file_count(dir.path()), 1);
    }

    #[test]
    fn non_trigger_line_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut sentry = sentry_with(
            vec!["All clear", "battery low"],
            StubCamera::new(64, 48),
            dir.path(),
        );

        assert!(matches!(
            sentry.poll_once().unwrap(),
            WatchEvent::Message(_)
        ));
        assert!(matches!(
            sentry.poll_once().unwrap(),
            WatchEvent::Message(_)
        ));
        assert_eq!(file_count(dir.path()), 0);
    }

    #[test]
    fn trigger_must_match_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let mut sentry = sentry_with(
            vec![
                "Intruder detected",        // missing the bang
                "oh no Intruder detected!", // contains, not equals
                "INTRUDER DETECTED!",       // case differs
            ],
            StubCamera::new(64, 48),
            dir.path(),
        );

        for _ in 0..3 {
            assert!(matches!(
                sentry.poll_once().unwrap(),
                WatchEvent::Message(_)
            ));
        }
        assert_eq!(file_count(dir.path()), 0);
    }

    #[test]
    fn capture_failure_is_reported_and_nonfatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut sentry = sentry_with(
            vec![TRIGGER, "status ok"],
            StubCamera::failing(64, 48),
            dir.path(),
        );

        assert!(matches!(
            sentry.poll_once().unwrap(),
            WatchEvent::CaptureFailed
        ));
        assert_eq!(file_count(dir.path()), 0);

        // Loop keeps serving subsequent messages.
        assert!(matches!(
            sentry.poll_once().unwrap(),
            WatchEvent::Message(_)
        ));
    }

    #[test]
    fn exhausted_source_reports_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut sentry = sentry_with(vec![], StubCamera::new(64, 48), dir.path());
        assert!(matches!(sentry.poll_once().unwrap(), WatchEvent::Idle));
    }
}
