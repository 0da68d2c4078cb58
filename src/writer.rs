use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::WriterSettings;
use crate::queue::{DeliveryQueue, QueuedLine};

/// Low bit of [`Shared::state`]; the remaining bits hold the generation.
const RUNNING: u64 = 1;

/// End mark of a session that has not been stopped yet.
const OPEN: u64 = u64::MAX;

/// Counters describing what a writer has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Number of writer sessions that opened the file.
    pub sessions: u64,
    /// Lines written and flushed.
    pub lines_written: u64,
    /// Lines dropped because the write or flush failed.
    pub lines_lost: u64,
    /// Highest number of sessions ever consuming at the same time.
    pub peak_active_sessions: usize,
}

/// State shared between the owning [`WriterTask`] and its consumer thread.
#[derive(Debug)]
struct Shared {
    path: PathBuf,
    settings: WriterSettings,
    queue: DeliveryQueue,
    /// Generation in the high bits, [`RUNNING`] in the low bit. Packed so a
    /// session can clear the flag only while its own generation is current.
    state: AtomicU64,
    /// Lines a stopped session dequeued but must not write, oldest first.
    /// The next session writes them before anything else.
    carry: Mutex<VecDeque<QueuedLine>>,
    active: AtomicUsize,
    peak_active: AtomicUsize,
    sessions: AtomicU64,
    lines_written: AtomicU64,
    lines_lost: AtomicU64,
}

impl Shared {
    fn open(&self) -> io::Result<BufWriter<File>> {
        let mut options = OpenOptions::new();
        options.create(true);
        if self.settings.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        options.open(&self.path).map(BufWriter::new)
    }

    fn write_line(&self, file: &mut BufWriter<File>, line: &str) {
        match writeln!(file, "{line}").and_then(|()| file.flush()) {
            Ok(()) => {
                self.lines_written.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.lines_lost.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to write log line"
                );
            }
        }
    }

    /// Write `entry` unless it was enqueued at or after `end`, in which case
    /// it belongs to a later session and is handed over. Returns whether it
    /// was written.
    fn deliver(&self, file: &mut BufWriter<File>, entry: QueuedLine, end: u64) -> bool {
        if entry.seq >= end {
            self.carry_lock().push_back(entry);
            return false;
        }
        self.write_line(file, &entry.line);
        true
    }

    fn carry_lock(&self) -> MutexGuard<'_, VecDeque<QueuedLine>> {
        self.carry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn carried(&self) -> usize {
        self.carry_lock().len()
    }
}

/// The consumer thread of the current (or last) session.
#[derive(Debug)]
struct Session {
    handle: JoinHandle<()>,
    /// Queue sequence number at which the session was stopped, [`OPEN`] until then.
    end: Arc<AtomicU64>,
}

/// Background consumer of a [`DeliveryQueue`].
///
/// The consumer thread is spawned lazily by the first [`enqueue`](Self::enqueue)
/// while idle and runs until [`stop`](Self::stop). It opens the target file
/// once per session and writes and flushes each line as it is dequeued.
///
/// A running flag guarded by compare-and-swap makes sure only one session is
/// spawned per idle period. A session started after a stop first waits for the
/// previous session to exit, so the file is never held open twice.
///
/// Stopping records the queue position at that moment. The stopped session
/// never writes a line enqueued after it; if it dequeues one anyway, the line
/// is handed to the next session, so reopening the file cannot erase it.
#[derive(Debug)]
pub struct WriterTask {
    shared: Arc<Shared>,
    session: Mutex<Option<Session>>,
}

impl WriterTask {
    /// Create an idle writer for `path`. Nothing is opened until the first line arrives.
    pub fn new(path: impl Into<PathBuf>, settings: WriterSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                path: path.into(),
                settings,
                queue: DeliveryQueue::new(),
                state: AtomicU64::new(0),
                carry: Mutex::new(VecDeque::new()),
                active: AtomicUsize::new(0),
                peak_active: AtomicUsize::new(0),
                sessions: AtomicU64::new(0),
                lines_written: AtomicU64::new(0),
                lines_lost: AtomicU64::new(0),
            }),
            session: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn settings(&self) -> &WriterSettings {
        &self.shared.settings
    }

    /// Whether a consumer session is currently supposed to be running.
    pub fn is_running(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) & RUNNING != 0
    }

    /// Lines accepted but not yet taken by a consumer.
    pub fn pending(&self) -> usize {
        self.shared.queue.len() + self.shared.carried()
    }

    pub fn stats(&self) -> WriterStats {
        WriterStats {
            sessions: self.shared.sessions.load(Ordering::Relaxed),
            lines_written: self.shared.lines_written.load(Ordering::Relaxed),
            lines_lost: self.shared.lines_lost.load(Ordering::Relaxed),
            peak_active_sessions: self.shared.peak_active.load(Ordering::Acquire),
        }
    }

    /// Queue a rendered line and make sure a consumer is running.
    pub fn enqueue(&self, line: String) {
        self.shared.queue.push(line);
        self.ensure_started();
    }

    /// Ask the consumer to stop. Does not wait for it.
    ///
    /// With `drain_on_stop` the consumer writes the lines enqueued before the
    /// stop before closing the file; without it those lines stay queued for
    /// the next session. Lines enqueued after the stop always go to the next
    /// session.
    pub fn stop(&self) {
        let slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        self.stop_locked(&slot);
    }

    /// Stop the consumer and block until its thread has exited.
    pub fn close_and_wait(&self) {
        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        self.stop_locked(&slot);
        if let Some(session) = slot.take()
            && session.handle.join().is_err()
        {
            tracing::error!(path = %self.shared.path.display(), "writer thread panicked");
        }
    }

    fn stop_locked(&self, slot: &Option<Session>) {
        let previous = self.shared.state.fetch_and(!RUNNING, Ordering::AcqRel);
        if previous & RUNNING == 0 {
            return;
        }
        if let Some(session) = slot.as_ref() {
            session.end.store(self.shared.queue.next_seq(), Ordering::SeqCst);
        }
        tracing::trace!(path = %self.shared.path.display(), "writer stop requested");
    }

    fn ensure_started(&self) {
        if self.is_running() {
            return;
        }

        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.shared.state.load(Ordering::Acquire);
        if current & RUNNING != 0 {
            return;
        }
        let generation = (current >> 1) + 1;
        let started = (generation << 1) | RUNNING;
        if self
            .shared
            .state
            .compare_exchange(current, started, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let previous = slot.take().map(|session| session.handle);
        let end = Arc::new(AtomicU64::new(OPEN));
        let shared = Arc::clone(&self.shared);
        let session_end = Arc::clone(&end);
        let spawned = thread::Builder::new()
            .name("cerddolog-writer".to_string())
            .spawn(move || {
                if let Some(previous) = previous
                    && previous.join().is_err()
                {
                    tracing::error!(path = %shared.path.display(), "writer thread panicked");
                }
                run_session(&shared, started, &session_end);
            });

        match spawned {
            Ok(handle) => *slot = Some(Session { handle, end }),
            Err(err) => {
                let _ = self.shared.state.compare_exchange(
                    started,
                    started & !RUNNING,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                tracing::error!(error = %err, "failed to spawn writer thread");
            }
        }
    }
}

impl Drop for WriterTask {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_session(shared: &Shared, started: u64, end: &AtomicU64) {
    let generation = started >> 1;
    let mut file = match shared.open() {
        Ok(file) => file,
        Err(err) => {
            tracing::error!(path = %shared.path.display(), error = %err, "failed to open log file");
            // Let the next enqueue retry, unless a stop or a newer session got there first.
            let _ = shared.state.compare_exchange(
                started,
                started & !RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            return;
        }
    };

    let active = shared.active.fetch_add(1, Ordering::AcqRel) + 1;
    shared.peak_active.fetch_max(active, Ordering::AcqRel);
    shared.sessions.fetch_add(1, Ordering::Relaxed);
    tracing::trace!(path = %shared.path.display(), generation, "writer session started");

    // Lines handed over by the previous session are older than anything still queued.
    let carried = std::mem::take(&mut *shared.carry_lock());
    for entry in carried {
        shared.deliver(&mut file, entry, end.load(Ordering::SeqCst));
    }

    let idle_cap = shared.settings.idle_poll();
    let mut idle = 0u32;
    while end.load(Ordering::SeqCst) == OPEN {
        match shared.queue.pop() {
            Some(entry) => {
                idle = 0;
                shared.deliver(&mut file, entry, end.load(Ordering::SeqCst));
            }
            None => {
                idle = idle.saturating_add(1);
                idle_backoff(idle, idle_cap);
            }
        }
    }

    if shared.settings.drain_on_stop {
        let end = end.load(Ordering::SeqCst);
        while let Some(entry) = shared.queue.pop() {
            if !shared.deliver(&mut file, entry, end) {
                break;
            }
        }
    }

    drop(file);
    shared.active.fetch_sub(1, Ordering::AcqRel);
    tracing::trace!(path = %shared.path.display(), generation, "writer session stopped");
}

fn idle_backoff(idle: u32, cap: Duration) {
    if idle < 10 {
        thread::yield_now();
    } else if idle < 100 {
        thread::sleep(Duration::from_micros(10).min(cap));
    } else {
        thread::sleep(cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_writer_starts_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lazy.log");
        let writer = WriterTask::new(&path, WriterSettings::default());

        assert!(!writer.is_running());
        assert!(!path.exists());

        writer.enqueue("first".to_string());
        assert!(writer.is_running());

        writer.close_and_wait();
        assert!(!writer.is_running());
        assert_eq!(read_lines(&path), ["first"]);
    }

    #[test]
    fn test_writer_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order.log");
        let writer = WriterTask::new(&path, WriterSettings::default());

        for i in 0..500 {
            writer.enqueue(format!("line {i}"));
        }
        writer.close_and_wait();

        let expected: Vec<_> = (0..500).map(|i| format!("line {i}")).collect();
        assert_eq!(read_lines(&path), expected);
        assert_eq!(writer.stats().lines_written, 500);
        assert_eq!(writer.pending(), 0);
    }

    #[test]
    fn test_restart_truncates_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restart.log");
        let writer = WriterTask::new(&path, WriterSettings::default());

        writer.enqueue("before".to_string());
        writer.close_and_wait();
        writer.enqueue("after".to_string());
        writer.close_and_wait();

        assert_eq!(read_lines(&path), ["after"]);
        assert_eq!(writer.stats().sessions, 2);
    }

    #[test]
    fn test_restart_appends_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("append.log");
        let writer = WriterTask::new(&path, WriterSettings::default().with_append(true));

        writer.enqueue("before".to_string());
        writer.close_and_wait();
        writer.enqueue("after".to_string());
        writer.close_and_wait();

        assert_eq!(read_lines(&path), ["before", "after"]);
    }

    #[test]
    fn test_concurrent_enqueue_spawns_one_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concurrent.log");
        let writer = Arc::new(WriterTask::new(&path, WriterSettings::default()));

        let handles: Vec<_> = (0..8)
            .map(|p| {
                let writer = Arc::clone(&writer);
                thread::spawn(move || {
                    for i in 0..100 {
                        writer.enqueue(format!("{p}-{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        writer.close_and_wait();

        let stats = writer.stats();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.peak_active_sessions, 1);
        assert_eq!(read_lines(&path).len(), 800);
    }

    #[test]
    fn test_stop_start_cycles_never_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycles.log");
        let writer = WriterTask::new(&path, WriterSettings::default().with_append(true));

        for i in 0..50 {
            writer.enqueue(format!("cycle {i}"));
            writer.stop();
        }
        writer.close_and_wait();

        let stats = writer.stats();
        assert_eq!(stats.peak_active_sessions, 1);
        assert!(stats.sessions >= 1);
    }

    #[test]
    fn test_open_failure_keeps_lines_queued() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a log file.
        let writer = WriterTask::new(dir.path(), WriterSettings::default());

        writer.enqueue("stuck".to_string());
        writer.close_and_wait();

        assert_eq!(writer.stats().sessions, 0);
        assert_eq!(writer.pending(), 1);
        assert!(!writer.is_running());
    }

    #[test]
    fn test_line_enqueued_after_stop_survives_restart() {
        // The stopped session may still be draining when the next line
        // arrives; that line must end up in the reopened file.
        for round in 0..20 {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("handover.log");
            let writer = WriterTask::new(&path, WriterSettings::default());

            writer.enqueue("first".to_string());
            writer.stop();
            writer.enqueue("second".to_string());
            writer.close_and_wait();

            let lines = read_lines(&path);
            assert_eq!(lines.last().map(String::as_str), Some("second"), "round {round}");
            assert_eq!(writer.pending(), 0, "round {round}");
            assert_eq!(writer.stats().peak_active_sessions, 1);
        }
    }

    #[test]
    fn test_lines_after_stop_keep_order_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handover-order.log");
        let writer = WriterTask::new(&path, WriterSettings::default().with_append(true));

        for i in 0..200 {
            writer.enqueue(format!("line {i}"));
            if i % 20 == 0 {
                writer.stop();
            }
        }
        writer.close_and_wait();

        let expected: Vec<_> = (0..200).map(|i| format!("line {i}")).collect();
        assert_eq!(read_lines(&path), expected);
        assert_eq!(writer.stats().lines_written, 200);
    }

    #[test]
    fn test_stop_without_drain_leaves_lines_for_next_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-drain.log");
        let settings = WriterSettings::default()
            .with_append(true)
            .with_drain_on_stop(false);
        let writer = WriterTask::new(&path, settings);

        const LINES: usize = 50_000;
        for i in 0..LINES {
            writer.enqueue(format!("line {i}"));
        }
        writer.close_and_wait();

        let written = writer.stats().lines_written as usize;
        assert!(writer.pending() > 0, "all {written} lines written before the stop");
        assert_eq!(written + writer.pending(), LINES);

        writer.enqueue("tail".to_string());
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while writer.pending() > 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        writer.close_and_wait();

        let mut expected: Vec<_> = (0..LINES).map(|i| format!("line {i}")).collect();
        expected.push("tail".to_string());
        assert_eq!(read_lines(&path), expected);
        assert_eq!(writer.stats().sessions, 2);
        assert_eq!(writer.pending(), 0);
    }
}
