//! Fluent builder for [`Logger`] instances.
//!
//! A builder is obtained from a [`LoggerRegistry`] and accumulates a location,
//! a name, an optional sink and writer settings. Location calls may create
//! missing parent directories; the log file itself is only created by a
//! terminal call (`build`, `build_and_store` or `store`).
//!
//! # Example
//!
//! ```rust,no_run
//! use cerddolog::LoggerRegistry;
//!
//! let registry = LoggerRegistry::new();
//!
//! // /var/log/CerddoPod/CerddoPod/SAPlayer-Log.md on Linux
//! let player = registry
//!     .new_logger()
//!     .use_default_loc()
//!     .log_name("CerddoPod", "SAPlayer")
//!     .build_and_store()?;
//!
//! player.info("Player ready");
//! registry.close_loggers();
//! # Ok::<(), cerddolog::Error>(())
//! ```

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::WriterSettings;
use crate::logger::{Logger, Sink};
use crate::path::LogName;
use crate::registry::LoggerRegistry;
use crate::{Error, Result};

/// A builder for configuring a single logger.
pub struct LoggerBuilder<'a> {
    registry: &'a LoggerRegistry,
    location: Option<PathBuf>,
    name: String,
    sink: Option<Sink>,
    writer: WriterSettings,
}

impl<'a> LoggerBuilder<'a> {
    pub(crate) fn new(registry: &'a LoggerRegistry) -> Self {
        Self {
            registry,
            location: None,
            name: String::new(),
            sink: None,
            writer: registry.writer_defaults().clone(),
        }
    }

    /// Start from an existing logger's location, sink, name and writer settings.
    pub(crate) fn from_logger(registry: &'a LoggerRegistry, logger: &Logger) -> Self {
        Self {
            registry,
            location: Some(logger.path().to_path_buf()),
            name: logger.name().to_string(),
            sink: logger.sink().cloned(),
            writer: logger.writer_settings().clone(),
        }
    }

    /// Set the base location of the log.
    ///
    /// The parent directory is created if needed; if that fails the location
    /// falls back to `<desktop>/CerddoPod-Log.md`.
    pub fn set_log_location(mut self, location: impl AsRef<Path>) -> Self {
        let resolver = self.registry.resolver();
        self.location = Some(resolver.resolve_location(Some(location.as_ref())));
        self
    }

    /// Use `<OS log dir>/CerddoPod` as the base location.
    ///
    /// Meant to be followed by [`log_name`](Self::log_name) or
    /// [`log_component`](Self::log_component).
    pub fn use_default_loc(mut self) -> Self {
        self.location = Some(self.registry.resolver().default_location());
        self
    }

    /// Name the log after a project component.
    ///
    /// For project `CerddoPod` and component `SAPlayer` the file becomes
    /// `<base>/CerddoPod/SAPlayer-Log.md` and the registry key
    /// `CerddoPod/SAPlayer`. Should follow a location call; if none was made,
    /// [`use_default_loc`](Self::use_default_loc) is applied first.
    pub fn log_name(self, project: impl Into<String>, component: impl Into<String>) -> Self {
        self.with_log_name(LogName::qualified(project, component))
    }

    /// Name the log after a standalone component: `<base>/<component>-Log.md`.
    ///
    /// Like [`log_name`](Self::log_name), falls back to the default location
    /// when no location was set.
    pub fn log_component(self, component: impl Into<String>) -> Self {
        self.with_log_name(LogName::component(component))
    }

    fn with_log_name(mut self, name: LogName) -> Self {
        let resolver = self.registry.resolver();
        let base = self
            .location
            .take()
            .unwrap_or_else(|| resolver.default_location());
        self.location = Some(resolver.compose(Some(base.as_path()), &name));
        self.name = name.registry_key();
        self
    }

    /// Mirror every message to a callback receiving the unformatted text.
    pub fn custom_logger<F>(self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.with_sink(Arc::new(sink))
    }

    /// Like [`custom_logger`](Self::custom_logger) with an already shared sink.
    pub fn with_sink(mut self, sink: Sink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Override the registry's default writer settings for this logger.
    pub fn with_writer_settings(mut self, settings: WriterSettings) -> Self {
        self.writer = settings;
        self
    }

    /// Location configured so far, if any.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Registry key configured so far. Empty until a name is set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the log file (and its directories) and return the logger
    /// without registering it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Materialize`] if the directory or file cannot be created.
    pub fn build(self) -> Result<Logger> {
        let path = self.target_path();
        materialize(&path)?;
        Ok(Logger::new(self.name, path, self.sink, self.writer))
    }

    /// Build the logger and register it under its name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnnamedLogger`] or [`Error::DuplicateLogger`] before
    /// touching the disk, or [`Error::Materialize`] if creation fails.
    pub fn build_and_store(self) -> Result<Arc<Logger>> {
        let registry = self.registry;
        let name = self.name.clone();
        registry.insert_with(&name, move || self.build())
    }

    /// Build and register the logger without returning it.
    pub fn store(self) -> Result<()> {
        self.build_and_store().map(|_| ())
    }

    fn target_path(&self) -> PathBuf {
        match &self.location {
            Some(location) if !location.as_os_str().is_empty() => location.clone(),
            _ => self.registry.resolver().default_file(),
        }
    }
}

/// Create missing parent directories and an empty file. Existing files are left untouched.
fn materialize(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.is_dir()
    {
        std::fs::create_dir_all(parent).map_err(|source| Error::Materialize {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists && !path.is_dir() => Ok(()),
        Err(source) => Err(Error::Materialize {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathResolver;
    use std::sync::Mutex;

    fn registry_in(dir: &Path) -> LoggerRegistry {
        LoggerRegistry::with_resolver(PathResolver::new(dir.join("desktop"), dir.join("var-log")))
    }

    #[test]
    fn test_builder_new_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_in(tmp.path());
        let builder = registry.new_logger();
        assert!(builder.location().is_none());
        assert_eq!(builder.name(), "");
    }

    #[test]
    fn test_default_loc_then_log_name() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_in(tmp.path());

        let builder = registry
            .new_logger()
            .use_default_loc()
            .log_name("CerddoPod", "SAPlayer");

        assert_eq!(builder.name(), "CerddoPod/SAPlayer");
        assert_eq!(
            builder.location(),
            Some(tmp.path().join("var-log/CerddoPod/CerddoPod/SAPlayer-Log.md").as_path())
        );
    }

    #[test]
    fn test_log_component_without_location_uses_default_loc() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_in(tmp.path());

        let builder = registry.new_logger().log_component("Net");

        assert_eq!(builder.name(), "Net");
        assert_eq!(
            builder.location(),
            Some(tmp.path().join("var-log/CerddoPod/Net-Log.md").as_path())
        );
    }

    #[test]
    fn test_set_log_location_then_component() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_in(tmp.path());

        let logger = registry
            .new_logger()
            .set_log_location(tmp.path().join("logs"))
            .log_component("Core")
            .build()
            .unwrap();

        assert_eq!(logger.path(), tmp.path().join("logs/Core-Log.md"));
        assert!(logger.path().is_file());
        assert!(!registry.contains("Core"));
    }

    #[test]
    fn test_build_without_location_uses_default_file() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_in(tmp.path());

        let logger = registry.new_logger().build().unwrap();

        assert_eq!(logger.path(), tmp.path().join("desktop/CerddoPod-Log.md"));
        assert!(logger.path().is_file());
        assert_eq!(logger.name(), "");
    }

    #[test]
    fn test_uncreatable_location_falls_back_to_default_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        let registry = registry_in(tmp.path());

        let builder = registry
            .new_logger()
            .set_log_location(blocker.join("nested/app.log"));

        assert_eq!(
            builder.location(),
            Some(tmp.path().join("desktop/CerddoPod-Log.md").as_path())
        );
    }

    #[test]
    fn test_build_twice_keeps_existing_content() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_in(tmp.path());
        let target = tmp.path().join("keep/App-Log.md");

        let first = registry
            .new_logger()
            .set_log_location(tmp.path().join("keep"))
            .log_component("App")
            .build()
            .unwrap();
        assert_eq!(first.path(), target);
        std::fs::write(&target, "existing line\n").unwrap();

        let second = registry
            .new_logger()
            .set_log_location(tmp.path().join("keep"))
            .log_component("App")
            .build()
            .unwrap();

        assert_eq!(second.path(), target);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "existing line\n");
    }

    #[test]
    fn test_materialize_failure_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_in(tmp.path());
        // The target path is an existing directory, so the file cannot be created.
        let dir_target = tmp.path().join("taken");
        std::fs::create_dir_all(&dir_target).unwrap();

        let err = registry
            .new_logger()
            .set_log_location(&dir_target)
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::Materialize { .. }), "{err}");
    }

    #[test]
    fn test_custom_logger_is_invoked() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_in(tmp.path());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);

        let logger = registry
            .new_logger()
            .set_log_location(tmp.path().join("sink"))
            .log_component("Sink")
            .custom_logger(move |msg| captured.lock().unwrap().push(msg.to_string()))
            .build()
            .unwrap();

        logger.warning("careful");
        logger.close_writer_and_wait();

        assert_eq!(*seen.lock().unwrap(), ["careful"]);
    }

    #[test]
    fn test_copy_from_clones_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_in(tmp.path());
        let original = registry
            .new_logger()
            .set_log_location(tmp.path().join("copy"))
            .log_name("Proj", "Comp")
            .custom_logger(|_| {})
            .with_writer_settings(WriterSettings::new().with_append(true))
            .build()
            .unwrap();

        let copy = registry.copy_from(&original).build().unwrap();

        assert_eq!(copy.name(), "Proj/Comp");
        assert_eq!(copy.path(), original.path());
        assert!(copy.sink().is_some());
        assert!(copy.writer_settings().append);
    }

    #[test]
    fn test_writer_defaults_come_from_registry() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_in(tmp.path())
            .with_writer_defaults(WriterSettings::new().with_drain_on_stop(false));

        let builder = registry.new_logger();
        assert!(!builder.writer.drain_on_stop);
    }
}
