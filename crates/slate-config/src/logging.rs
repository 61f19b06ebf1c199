//! Global `tracing` setup and the in-memory log tail shown by the log panel.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, Once, OnceLock};

use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;

use crate::LoggingConfig;

/// Bounded tail of formatted log lines. The oldest line is dropped once `capacity` is reached.
#[derive(Debug)]
pub struct LogBuffer {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            lines: Mutex::new(VecDeque::new()),
        }
    }

    fn with_lines<R>(&self, f: impl FnOnce(&mut VecDeque<String>) -> R) -> R {
        let mut lines = self.lines.lock().unwrap_or_else(|err| err.into_inner());
        f(&mut lines)
    }

    pub fn push_line(&self, line: String) {
        self.with_lines(|lines| {
            while lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(line);
        });
    }

    /// Up to `n` most recent lines, oldest first.
    pub fn last_lines(&self, n: usize) -> Vec<String> {
        self.with_lines(|lines| {
            let skip = lines.len().saturating_sub(n);
            lines.iter().skip(skip).cloned().collect()
        })
    }

    pub fn len(&self) -> usize {
        self.with_lines(|lines| lines.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hands each formatted event to the [`LogBuffer`] line by line.
struct BufferSink(Arc<LogBuffer>);

impl<'a> MakeWriter<'a> for BufferSink {
    type Writer = PendingEvent;

    fn make_writer(&'a self) -> Self::Writer {
        PendingEvent {
            buffer: self.0.clone(),
            text: Vec::new(),
        }
    }
}

/// One event's formatted bytes; split into lines when the formatter drops it.
struct PendingEvent {
    buffer: Arc<LogBuffer>,
    text: Vec<u8>,
}

impl Write for PendingEvent {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.text.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PendingEvent {
    fn drop(&mut self) {
        String::from_utf8_lossy(&self.text)
            .lines()
            .filter(|line| !line.is_empty())
            .for_each(|line| self.buffer.push_line(line.to_owned()));
    }
}

static TRACING_INIT: Once = Once::new();
static LOG_BUFFER: OnceLock<Arc<LogBuffer>> = OnceLock::new();

/// Installs the global `tracing` subscriber described by `logging`.
///
/// Only the first call installs anything. Every call returns the same log buffer, sized by the
/// first caller's `buffer_lines`.
pub fn init_tracing(logging: &LoggingConfig) -> Arc<LogBuffer> {
    let buffer = LOG_BUFFER
        .get_or_init(|| Arc::new(LogBuffer::new(logging.buffer_lines)))
        .clone();

    TRACING_INIT.call_once(|| {
        let mut writer = BoxMakeWriter::new(BufferSink(buffer.clone()));
        if logging.stderr {
            writer = BoxMakeWriter::new(writer.and(io::stderr));
        }
        let mut file_error = None;
        if let Some(path) = &logging.file {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => writer = BoxMakeWriter::new(writer.and(Arc::new(file))),
                Err(err) => file_error = Some((path, err)),
            }
        }

        let fmt = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if logging.json {
            fmt.json().boxed()
        } else {
            fmt.boxed()
        };

        let installed = tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(logging.env_filter())
                .with(layer),
        )
        .is_ok();
        if let (true, Some((path, err))) = (installed, file_error) {
            tracing::warn!(
                target: "slate.config",
                path = %path.display(),
                error = %err,
                "failed to open log file; file logging disabled"
            );
        }
    });

    buffer
}
