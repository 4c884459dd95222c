//! Rolling Logger
//!
//! File logger that keeps only the most recent lines on disk.
//! Events from `tracing` and records from the `log` facade land in the same file.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

/// Lines kept on disk per log file
pub const DEFAULT_CAPACITY: usize = 2000;

static LOGGER: OnceLock<RollingWriter> = OnceLock::new();

/// Log file backed by a circular line buffer.
///
/// New lines are appended to the file. Once the number of lines appended since
/// the last compaction reaches the capacity, the file is rewritten from the
/// buffer so it never holds more than `2 * capacity` lines.
#[derive(Debug)]
pub struct RollingFile {
    path: PathBuf,
    lines: VecDeque<String>,
    capacity: usize,
    pending: String,
    appended: usize,
}

impl RollingFile {
    /// Open (or create) the log file, keeping the tail of any existing content
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> io::Result<Self> {
        let path = path.into();
        let capacity = capacity.max(1);
        let mut lines = VecDeque::with_capacity(capacity);

        if path.exists() {
            let existing = fs::read_to_string(&path)?;
            for line in existing.lines() {
                if lines.len() == capacity {
                    lines.pop_front();
                }
                lines.push_back(line.to_string());
            }
        }

        let mut file = Self {
            path,
            lines,
            capacity,
            pending: String::new(),
            appended: 0,
        };
        file.compact()?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recent `n` complete lines, oldest first
    pub fn recent(&self, n: usize) -> Vec<String> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip).cloned().collect()
    }

    fn push_line(&mut self, line: String) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;

        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        self.appended += 1;

        if self.appended >= self.capacity {
            self.compact()?;
        }
        Ok(())
    }

    /// Rewrite the file from the buffer
    fn compact(&mut self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&self.path)?;
        for line in &self.lines {
            writeln!(file, "{}", line)?;
        }
        self.appended = 0;
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &str) -> io::Result<()> {
        self.pending.push_str(chunk);
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            self.push_line(line.trim_end_matches(['\r', '\n']).to_string())?;
        }
        Ok(())
    }
}

/// Cloneable handle handed to `tracing-subscriber` as its writer
#[derive(Debug, Clone)]
pub struct RollingWriter {
    inner: Arc<Mutex<RollingFile>>,
}

impl RollingWriter {
    pub fn new(file: RollingFile) -> Self {
        Self {
            inner: Arc::new(Mutex::new(file)),
        }
    }

    pub fn recent(&self, n: usize) -> Vec<String> {
        match self.inner.lock() {
            Ok(file) => file.recent(n),
            Err(_) => Vec::new(),
        }
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        file.write_chunk(&String::from_utf8_lossy(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Local wall-clock timestamps, millisecond precision
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global subscriber writing to `<dir>/<app_name>.log`.
///
/// Also captures `log` records, so library code can stay on the `log` facade.
pub fn init_logger(dir: PathBuf, app_name: &str) -> Result<(), String> {
    if LOGGER.get().is_some() {
        return Err("Logger already initialized".to_string());
    }

    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create log dir: {}", e))?;
    let path = dir.join(format!("{}.log", app_name));
    let file = RollingFile::open(&path, DEFAULT_CAPACITY)
        .map_err(|e| format!("Failed to open log file: {}", e))?;
    let writer = RollingWriter::new(file);

    tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_timer(LocalTimer)
        .with_ansi(false)
        .with_target(true)
        .with_max_level(tracing::Level::DEBUG)
        .finish()
        .try_init()
        .map_err(|e| format!("Failed to install subscriber: {}", e))?;

    LOGGER
        .set(writer)
        .map_err(|_| "Logger already initialized".to_string())?;

    log::info!(target: "rolling_logger", "{} logging to {}", app_name, path.display());
    Ok(())
}

fn ensure_initialized() -> Result<(), String> {
    LOGGER
        .get()
        .map(|_| ())
        .ok_or_else(|| "Logger not initialized".to_string())
}

pub fn info(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::info!("{}", msg);
    Ok(())
}

pub fn warn(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::warn!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::error!("{}", msg);
    Ok(())
}

/// Most recent `n` lines written through the global logger
pub fn recent_lines(n: usize) -> Vec<String> {
    LOGGER.get().map(|w| w.recent(n)).unwrap_or_default()
}
