//! # Cerddolog
//!
//! An embeddable logger that writes severity-tagged lines to a file from a
//! background thread.
//!
//! ## Features
//!
//! - Non-blocking emit: lines go through a lock-free queue to a writer thread
//!   that starts on the first message and flushes every line
//! - Deterministic log paths from a base location plus project/component names
//! - A registry of named loggers with a fluent builder
//! - Optional sink callback mirroring each message
//!
//! Each line looks like `[*] - [2024-01-02 03:04:05] => disk full`, with the
//! markers `i`, `@`, `*` and `!` for info, warning, error and fatal.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cerddolog::LoggerRegistry;
//!
//! let registry = LoggerRegistry::new();
//! let net = registry
//!     .new_logger()
//!     .set_log_location("/tmp/app-logs")
//!     .log_name("App", "Net")
//!     .custom_logger(|msg| eprintln!("net: {msg}"))
//!     .build_and_store()?;
//!
//! net.error("disk full");
//! registry.close_loggers_and_wait();
//! # Ok::<(), cerddolog::Error>(())
//! ```

pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logger;
pub mod path;
pub mod queue;
pub mod record;
pub mod registry;
pub mod writer;

pub use builder::LoggerBuilder;
pub use config::{DiagnosticsConfig, LogConfig, WriterSettings};
pub use diagnostics::init_diagnostics;
pub use error::{Error, Result};
pub use logger::{Logger, Sink};
pub use path::{LogName, PathResolver};
pub use queue::{DeliveryQueue, QueuedLine};
pub use record::{LogRecord, Severity};
pub use registry::LoggerRegistry;
pub use writer::{WriterStats, WriterTask};
