//! Example of building a logger from a YAML configuration file.
//!
//! Run with:
//! ```bash
//! cargo run --example config_yaml
//! ```

use std::collections::HashMap;
use std::fs;

use cerddolog::{LogConfig, LoggerRegistry, init_diagnostics};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = "demos/config.yaml";
    let config_content = fs::read_to_string(config_path)?;

    let root: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(&config_content)?;
    let log_section = root
        .get("log")
        .cloned()
        .ok_or("missing `log` section")?;
    let config: LogConfig = serde_yaml::from_value(log_section)?;

    init_diagnostics(&config.diagnostics, None)?;

    let registry = LoggerRegistry::new();
    let logger = registry.new_logger_from_config(&config)?.build_and_store()?;

    logger.info("Loaded configuration");
    logger.warning("Configured from YAML");

    registry.close_loggers_and_wait();
    println!("wrote {}", logger.path().display());

    Ok(())
}
