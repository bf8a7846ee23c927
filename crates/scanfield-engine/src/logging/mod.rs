//! Logging utilities.
//!
//! Centralizes logger initialization. The engine itself only speaks through
//! the `log` facade; binaries pick the backend by calling [`init_logging`].

mod init;

pub use init::{init_logging, LoggingConfig};
