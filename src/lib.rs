//! Core of a terminal emulator: UTF-8 codec (C1), styled line buffer (C2),
//! PTY bridge (C3), two-screen grid model (C4), escape/ANSI state machine
//! (C5), scroll view (C6), and the façade tying them together (C7).
//!
//! This crate has no GUI, clipboard, or window-management surface; those
//! concerns belong to a platform shell built on top of [`facade::Terminal`].

pub mod codec;
pub mod config;
pub mod facade;
pub mod pty;
pub mod terminal;
pub mod view;

pub use config::TerminalConfig;
pub use facade::{Key, Terminal, TerminalEvent};

/// Installs a `tracing` subscriber reading `TERMCORE_LOG` (falling back to
/// `info`), matching the teacher's `tracing_subscriber::fmt()` setup. Not
/// called automatically: a library has no business installing a global
/// subscriber behind its consumer's back.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "termcore=info".into()))
        .init();
}
