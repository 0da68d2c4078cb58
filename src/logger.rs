use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::WriterSettings;
use crate::record::{LogRecord, Severity};
use crate::writer::{WriterStats, WriterTask};

/// Caller-supplied callback that mirrors each message outside the file pipeline.
///
/// It receives the unformatted message text and runs synchronously on the
/// emitting thread. A panic in the sink propagates to the caller.
pub type Sink = Arc<dyn Fn(&str) + Send + Sync + 'static>;

/// A named binding of a log file, an optional sink and a background writer.
///
/// Built with [`LoggerBuilder`](crate::LoggerBuilder). Emitting never blocks
/// on I/O: lines are queued and written by the writer thread, which is
/// started on the first emit and stopped with [`close_writer`](Self::close_writer).
pub struct Logger {
    name: String,
    sink: Option<Sink>,
    writer: WriterTask,
}

impl Logger {
    pub(crate) fn new(
        name: String,
        path: PathBuf,
        sink: Option<Sink>,
        settings: WriterSettings,
    ) -> Self {
        Self {
            name,
            sink,
            writer: WriterTask::new(path, settings),
        }
    }

    /// Registry key. Empty for loggers built without a name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved log file path.
    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    pub fn sink(&self) -> Option<&Sink> {
        self.sink.as_ref()
    }

    pub fn writer_settings(&self) -> &WriterSettings {
        self.writer.settings()
    }

    pub fn writer_stats(&self) -> WriterStats {
        self.writer.stats()
    }

    pub fn is_writer_running(&self) -> bool {
        self.writer.is_running()
    }

    /// Format, queue and mirror a message.
    pub fn emit(&self, severity: Severity, message: impl AsRef<str>) {
        let message = message.as_ref();
        let record = LogRecord::new(severity, message);
        self.writer.enqueue(record.render());

        if let Some(sink) = &self.sink {
            sink(message);
        }
    }

    /// Informational message, can be ignored.
    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(Severity::Info, message);
    }

    /// Something the user might want to note.
    pub fn warning(&self, message: impl AsRef<str>) {
        self.emit(Severity::Warning, message);
    }

    /// Something that should be investigated or reported.
    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(Severity::Error, message);
    }

    /// Something that really should be investigated. Delivered like any other level.
    pub fn fatal(&self, message: impl AsRef<str>) {
        self.emit(Severity::Fatal, message);
    }

    /// Stop the background writer without waiting for it.
    ///
    /// A later emit starts a new writer session.
    pub fn close_writer(&self) {
        self.writer.stop();
    }

    /// Stop the background writer and wait until it has closed the file.
    pub fn close_writer_and_wait(&self) {
        self.writer.close_and_wait();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("path", &self.path())
            .field("sink", &self.sink.as_ref().map(|_| "<fn>"))
            .field("writer", &self.writer)
            .finish()
    }
}
