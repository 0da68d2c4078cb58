use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::builder::LoggerBuilder;
use crate::config::{LogConfig, WriterSettings};
use crate::logger::Logger;
use crate::path::PathResolver;
use crate::{Error, Result};

/// Message emitted through every registered logger by [`LoggerRegistry::close_loggers`].
pub const CLOSING_MESSAGE: &str = "Closing Log...";

/// Name-to-logger directory and the entry point for building loggers.
///
/// Create one per application and pass it (or an `Arc` of it) to whoever
/// needs to look loggers up. Registration is expected to happen at startup;
/// lookups and registration are serialized by an internal mutex.
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    resolver: PathResolver,
    writer_defaults: WriterSettings,
    loggers: Mutex<BTreeMap<String, Arc<Logger>>>,
}

impl LoggerRegistry {
    /// Registry resolving paths against the platform's directories.
    pub fn new() -> Self {
        Self::with_resolver(PathResolver::system())
    }

    /// Registry with a custom path resolver.
    pub fn with_resolver(resolver: PathResolver) -> Self {
        Self {
            resolver,
            writer_defaults: WriterSettings::default(),
            loggers: Mutex::new(BTreeMap::new()),
        }
    }

    /// Writer settings handed to every new builder.
    pub fn with_writer_defaults(mut self, settings: WriterSettings) -> Self {
        self.writer_defaults = settings;
        self
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn writer_defaults(&self) -> &WriterSettings {
        &self.writer_defaults
    }

    /// Begin configuring a fresh logger.
    pub fn new_logger(&self) -> LoggerBuilder<'_> {
        LoggerBuilder::new(self)
    }

    /// Begin configuring a logger with the location, sink and name of `logger`.
    pub fn copy_from(&self, logger: &Logger) -> LoggerBuilder<'_> {
        LoggerBuilder::from_logger(self, logger)
    }

    /// Begin configuring a logger from a loaded [`LogConfig`].
    ///
    /// An explicit `location` wins over `use_default_location`. A project
    /// without a component is rejected.
    pub fn new_logger_from_config(&self, config: &LogConfig) -> Result<LoggerBuilder<'_>> {
        let mut builder = self
            .new_logger()
            .with_writer_settings(config.writer.clone());

        if let Some(location) = &config.location {
            builder = builder.set_log_location(location);
        } else if config.use_default_location {
            builder = builder.use_default_loc();
        }

        builder = match (&config.project, &config.component) {
            (Some(project), Some(component)) => builder.log_name(project, component),
            (None, Some(component)) => builder.log_component(component),
            (Some(project), None) => {
                return Err(Error::Config(format!(
                    "project {project:?} configured without a component"
                )));
            }
            (None, None) => builder,
        };

        Ok(builder)
    }

    /// Look up a registered logger.
    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Emit a closing notice through every registered logger and stop its writer.
    ///
    /// Loggers stay registered; emitting again restarts their writers.
    pub fn close_loggers(&self) {
        for logger in self.snapshot() {
            logger.info(CLOSING_MESSAGE);
            logger.close_writer();
        }
    }

    /// Like [`close_loggers`](Self::close_loggers), but waits for every writer to finish.
    pub fn close_loggers_and_wait(&self) {
        for logger in self.snapshot() {
            logger.info(CLOSING_MESSAGE);
            logger.close_writer_and_wait();
        }
    }

    /// Register the logger produced by `make` under `name`.
    ///
    /// Name checks happen before `make` runs, and the lock is held throughout
    /// so two builders cannot claim the same name.
    pub(crate) fn insert_with<F>(&self, name: &str, make: F) -> Result<Arc<Logger>>
    where
        F: FnOnce() -> Result<Logger>,
    {
        if name.is_empty() {
            return Err(Error::UnnamedLogger);
        }

        let mut loggers = self.lock();
        if loggers.contains_key(name) {
            return Err(Error::DuplicateLogger(name.to_string()));
        }

        let logger = Arc::new(make()?);
        loggers.insert(name.to_string(), Arc::clone(&logger));
        tracing::debug!(name, path = %logger.path().display(), "registered logger");
        Ok(logger)
    }

    fn snapshot(&self) -> Vec<Arc<Logger>> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Arc<Logger>>> {
        self.loggers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
