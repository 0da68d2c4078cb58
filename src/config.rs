use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a logger, loadable from YAML or TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Explicit base location (directory the log name is appended to, or the log file itself)
    #[serde(default)]
    pub location: Option<PathBuf>,
    /// Use the OS log directory when no explicit location is given
    #[serde(default)]
    pub use_default_location: bool,
    /// Project the component belongs to
    #[serde(default)]
    pub project: Option<String>,
    /// Component name, also the registry key
    #[serde(default)]
    pub component: Option<String>,
    /// Background writer settings
    #[serde(default)]
    pub writer: WriterSettings,
    /// Settings for the crate's own diagnostic output
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl LogConfig {
    /// Create a new LogConfig with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base location
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Fall back to the OS log directory
    pub fn with_default_location(mut self, enabled: bool) -> Self {
        self.use_default_location = enabled;
        self
    }

    /// Set the project name
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the component name
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Set writer settings
    pub fn with_writer(mut self, writer: WriterSettings) -> Self {
        self.writer = writer;
        self
    }

    /// Set diagnostics settings
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsConfig) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

/// Settings for a logger's background writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterSettings {
    /// Append to the file instead of truncating it at each session start
    #[serde(default)]
    pub append: bool,
    /// Write lines still queued when the writer is stopped
    #[serde(default = "default_drain_on_stop")]
    pub drain_on_stop: bool,
    /// Longest sleep between polls of an empty queue, in milliseconds
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
}

impl WriterSettings {
    pub fn new() -> Self {
        Self {
            append: false,
            drain_on_stop: default_drain_on_stop(),
            idle_poll_ms: default_idle_poll_ms(),
        }
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn with_drain_on_stop(mut self, drain: bool) -> Self {
        self.drain_on_stop = drain;
        self
    }

    pub fn with_idle_poll_ms(mut self, ms: u64) -> Self {
        self.idle_poll_ms = ms;
        self
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings for the crate's own `tracing` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Enable diagnostic output on stderr
    #[serde(default)]
    pub console: bool,
    /// Diagnostic level (e.g., "info", "debug")
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format ("text" or "json")
    #[serde(default = "default_format")]
    pub format: String,
}

impl DiagnosticsConfig {
    pub fn new() -> Self {
        Self {
            console: false,
            level: default_level(),
            format: default_format(),
        }
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_drain_on_stop() -> bool {
    true
}

fn default_idle_poll_ms() -> u64 {
    1
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert!(config.location.is_none());
        assert!(!config.use_default_location);
        assert!(config.project.is_none());
        assert!(config.component.is_none());
        assert_eq!(config.writer, WriterSettings::default());
        assert_eq!(config.diagnostics.level, "info");
    }

    #[test]
    fn test_writer_settings_default() {
        let settings = WriterSettings::default();
        assert!(!settings.append);
        assert!(settings.drain_on_stop);
        assert_eq!(settings.idle_poll(), Duration::from_millis(1));
    }

    #[test]
    fn test_log_config_chaining() {
        let config = LogConfig::new()
            .with_location("/tmp/logs")
            .with_project("CerddoPod")
            .with_component("SAPlayer")
            .with_writer(WriterSettings::new().with_append(true).with_idle_poll_ms(5));

        assert_eq!(config.location, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(config.project.as_deref(), Some("CerddoPod"));
        assert_eq!(config.component.as_deref(), Some("SAPlayer"));
        assert!(config.writer.append);
        assert_eq!(config.writer.idle_poll_ms, 5);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
use_default_location: true
project: CerddoPod
component: SAPlayer
writer:
  append: true
diagnostics:
  console: true
  level: debug
"#;
        let config: LogConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.use_default_location);
        assert_eq!(config.project.as_deref(), Some("CerddoPod"));
        assert!(config.writer.append);
        assert!(config.writer.drain_on_stop);
        assert_eq!(config.writer.idle_poll_ms, 1);
        assert!(config.diagnostics.console);
        assert_eq!(config.diagnostics.level, "debug");
        assert_eq!(config.diagnostics.format, "text");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
location = "/srv/logs"
component = "Net"

[writer]
drain_on_stop = false
idle_poll_ms = 10

[diagnostics]
format = "json"
"#;
        let config: LogConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.location, Some(PathBuf::from("/srv/logs")));
        assert!(config.project.is_none());
        assert_eq!(config.component.as_deref(), Some("Net"));
        assert!(!config.writer.drain_on_stop);
        assert_eq!(config.writer.idle_poll_ms, 10);
        assert_eq!(config.diagnostics.format, "json");
    }

    #[test]
    fn test_parse_empty() {
        let config: LogConfig = toml::from_str("").unwrap();
        assert_eq!(config, LogConfig::default());
    }
}
