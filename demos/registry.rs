//! Several named loggers shared through one registry.
//!
//! Each component gets its own file under `<tmp>/cerddolog-demo/Player/`,
//! messages are mirrored to stdout through a sink, and the registry closes
//! every logger at the end.
//!
//! Run with:
//! ```bash
//! cargo run --example registry
//! ```

use std::sync::Arc;
use std::thread;

use cerddolog::{DiagnosticsConfig, LoggerRegistry, init_diagnostics};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_diagnostics(&DiagnosticsConfig::new().with_console(true), Some(1))?;

    let registry = Arc::new(LoggerRegistry::new());
    let base = std::env::temp_dir().join("cerddolog-demo");

    for component in ["Decoder", "Output"] {
        registry
            .new_logger()
            .set_log_location(&base)
            .log_name("Player", component)
            .custom_logger(move |msg| println!("{component}: {msg}"))
            .store()?;
    }

    let workers: Vec<_> = registry
        .names()
        .into_iter()
        .map(|name| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                if let Some(logger) = registry.get(&name) {
                    for i in 0..3 {
                        logger.info(format!("frame {i}"));
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        if worker.join().is_err() {
            tracing::error!("demo worker thread panicked");
        }
    }

    registry.close_loggers_and_wait();
    for name in registry.names() {
        if let Some(logger) = registry.get(&name) {
            println!("{name} -> {}", logger.path().display());
        }
    }

    Ok(())
}
