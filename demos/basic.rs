//! Basic file logging example.
//!
//! Builds a single unregistered logger in the system temp directory, writes
//! one message per severity and waits for the writer to finish.
//!
//! Run with:
//! ```bash
//! cargo run --example basic
//! ```

use cerddolog::LoggerRegistry;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = LoggerRegistry::new();
    let logger = registry
        .new_logger()
        .set_log_location(std::env::temp_dir().join("cerddolog-demo"))
        .log_component("Basic")
        .build()?;

    logger.info("This is an info message");
    logger.warning("This is a warning message");
    logger.error("This is an error message");
    logger.fatal("This is a fatal message");

    logger.close_writer_and_wait();
    println!("{}", std::fs::read_to_string(logger.path())?);

    Ok(())
}
