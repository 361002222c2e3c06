use std::sync::mpsc::Sender;

use tracing::Level;

use crate::types::NotificationKind;

/// Long-running operations the coordinator runs on worker threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Search,
    Download,
    Processing,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskKind::Search => "search",
            TaskKind::Download => "download",
            TaskKind::Processing => "processing",
        };
        f.write_str(name)
    }
}

/// One line of the user-facing log stream
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: Level,
    pub timestamp: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, message: String) -> Self {
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        Self {
            level,
            timestamp,
            message,
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {:>5} {}", self.timestamp, self.level, self.message)
    }
}

/// Messages flowing from worker tasks to the foreground coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Log(LogEntry),
    Notify {
        kind: NotificationKind,
        title: String,
        message: String,
    },
    /// Whether a download may be started from the current product list
    DownloadEnabled(bool),
    TaskFinished(TaskKind),
}

/// Sending half of the event channel handed to pipeline code.
///
/// Every log call is mirrored to `tracing`. A closed or absent channel is not an error:
/// pipelines keep running when nobody is listening.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    tx: Option<Sender<Event>>,
}

impl Reporter {
    pub fn new(tx: Sender<Event>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Reporter that only logs through `tracing`
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn send(&self, event: Event) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    fn log(&self, level: Level, message: String) {
        self.send(Event::Log(LogEntry::new(level, message)));
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.log(Level::INFO, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.log(Level::WARN, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        self.log(Level::ERROR, message);
    }

    pub fn notify(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.send(Event::Notify {
            kind,
            title: title.into(),
            message: message.into(),
        });
    }

    pub fn set_download_enabled(&self, enabled: bool) {
        self.send(Event::DownloadEnabled(enabled));
    }
}
