use crossterm::event::{self, Event, KeyCode, KeyEvent};
use crossterm::terminal;
use std::io;
use std::time::Duration;

/// Raw-mode guard for the watch loop so the quit key arrives without line
/// buffering. Restores the terminal on drop, including error paths.
pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    /// Headless runs (no tty) simply skip raw mode.
    pub fn enter() -> Self {
        let active = terminal::enable_raw_mode().is_ok();
        Self { active }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = terminal::disable_raw_mode();
        }
    }
}

pub fn check_for_quit() -> io::Result<bool> {
    if event::poll(Duration::from_millis(0))? {
        if let Event::Key(KeyEvent { code, .. }) = event::read()? {
            return Ok(code == KeyCode::Esc || code == KeyCode::Char('q'));
        }
    }
    Ok(false)
}
