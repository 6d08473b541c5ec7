//! Background packet logger.
//!
//! The network path only enqueues; a dedicated worker thread renders items,
//! applies the filter table, and writes the log file. The log file is opened
//! lazily when the first item is rendered and named after the session start
//! time. Dropping the logger blocks until every queued item has been
//! written.

use crate::{
    config::ConfigWatcher,
    protocol::{ConnectionState, Message, Origin},
};
use std::{
    collections::VecDeque,
    fs::File,
    io::Write,
    path::PathBuf,
    sync::{Arc, Condvar, Mutex},
    thread,
    time::Instant,
};

/// One enqueued packet. `message` is `None` when decoding failed.
#[derive(Debug)]
pub struct LogItem {
    pub message: Option<Message>,
    pub timestamp: Instant,
    pub state: ConnectionState,
    pub origin: Origin,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<QueueState>,
    wakeup: Condvar,
}

#[derive(Default)]
struct QueueState {
    items: VecDeque<LogItem>,
    running: bool,
}

/// Handle to the per-session logging worker.
pub struct PacketLogger {
    shared: Arc<Shared>,
    worker: Option<thread::JoinHandle<()>>,
}

impl PacketLogger {
    /// Creates the logger; log files go to the working directory.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self::with_directory(config_path, ".")
    }

    /// Creates the logger with an explicit directory for log files.
    pub fn with_directory(
        config_path: impl Into<PathBuf>,
        log_directory: impl Into<PathBuf>,
    ) -> Self {
        let shared = Arc::new(Shared::default());
        shared.queue.lock().unwrap().running = true;

        let worker_shared = Arc::clone(&shared);
        let config_path = config_path.into();
        let log_directory = log_directory.into();
        let worker = thread::spawn(move || {
            let mut worker = Worker {
                config: ConfigWatcher::new(config_path),
                log_directory,
                output: None,
            };
            worker.consume(&worker_shared);
        });

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Enqueues one packet for rendering and returns immediately.
    pub fn log(&self, message: Option<Message>, state: ConnectionState, origin: Origin) {
        let item = LogItem {
            message,
            timestamp: Instant::now(),
            state,
            origin,
        };
        let mut queue = self.shared.queue.lock().unwrap();
        queue.items.push_back(item);
        self.shared.wakeup.notify_all();
    }
}

impl Drop for PacketLogger {
    /// Blocks until the queue has drained and the file is closed.
    fn drop(&mut self) {
        self.shared.queue.lock().unwrap().running = false;
        self.shared.wakeup.notify_all();
        if let Some(worker) = self.worker.take() {
            worker.join().ok();
        }
    }
}

struct Worker {
    config: ConfigWatcher,
    log_directory: PathBuf,
    /// Opened on the first rendered item.
    output: Option<(File, Instant)>,
}

impl Worker {
    fn consume(&mut self, shared: &Shared) {
        loop {
            let item = {
                let mut queue = shared.queue.lock().unwrap();
                loop {
                    if let Some(item) = queue.items.pop_front() {
                        break Some(item);
                    }
                    if !queue.running {
                        break None;
                    }
                    queue = shared.wakeup.wait(queue).unwrap();
                }
            };
            // Queue drained and the handle is gone.
            let Some(item) = item else { return };

            self.render(item);
            self.config.poll();
        }
    }

    fn render(&mut self, item: LogItem) {
        if self.output.is_none() {
            let name = format!(
                "{}_log.txt",
                chrono::Local::now().format("%Y-%m-%d-%H-%M-%S")
            );
            let path = self.log_directory.join(name);
            match File::create(&path) {
                Ok(file) => self.output = Some((file, item.timestamp)),
                Err(e) => {
                    tracing::error!("Error trying to open log file {}: {e}", path.display());
                    return;
                }
            }
        }
        let Some((file, start_time)) = self.output.as_mut() else {
            return;
        };

        let Some(line) = render_line(&item, *start_time, self.config.filters()) else {
            return;
        };

        writeln!(file, "{line}").and_then(|()| file.flush()).ok();
        if self.config.filters().log_to_console {
            println!("{line}");
        }
    }
}

/// Renders one item to its log line, or `None` if it is filtered out.
fn render_line(
    item: &LogItem,
    start_time: Instant,
    filters: &crate::config::FilterTable,
) -> Option<String> {
    let elapsed = item.timestamp.saturating_duration_since(start_time);
    let millis = elapsed.as_millis();
    let stamp = format!(
        "[{}:{}:{}:{}] {} ",
        millis / 3_600_000,
        (millis / 60_000) % 60,
        (millis / 1_000) % 60,
        millis % 1_000,
        item.origin.arrow(),
    );

    let Some(message) = &item.message else {
        return Some(format!("{stamp}UNKNOWN OR WRONGLY PARSED MESSAGE"));
    };

    if filters.is_ignored(item.state, item.origin, message.id()) {
        return None;
    }

    let mut line = format!("{stamp}{}", message.name());
    if filters.is_detailed(item.state, item.origin, message.id()) {
        let dump = serde_json::to_string_pretty(&message.fields()).unwrap_or_default();
        line.push('\n');
        line.push_str(&dump);
    }
    Some(line)
}
