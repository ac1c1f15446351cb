pub mod keys;

pub use keys::{check_for_quit, TerminalGuard};
