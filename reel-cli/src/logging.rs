use log::{LevelFilter, Log, Metadata, Record};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};

const LOG_CAPACITY: usize = 500;

/// Session worker threads are named `reel-<role>:<media>`.
const WORKER_PREFIX: &str = "reel-";

/// Newest log lines, shared between the logger, the stderr reader and the UI.
#[derive(Clone, Default)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl LogBuffer {
    fn push(&self, line: String) {
        let mut lines = self.lines.lock().unwrap();
        if lines.len() >= LOG_CAPACITY {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines.lock().unwrap().iter().cloned().collect()
    }

    /// Lines logged at `[WARN]` or `[ERROR]`, oldest first.
    pub fn problems(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.starts_with("[WARN]") || line.starts_with("[ERROR]"))
            .cloned()
            .collect()
    }
}

struct SharedLogger {
    level: LevelFilter,
    buffer: LogBuffer,
    echo_stderr: bool,
}

impl Log for SharedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(
            record.level(),
            thread::current().name(),
            &record.args().to_string(),
        );
        if self.echo_stderr {
            eprintln!("{}", line);
        }
        self.buffer.push(line);
    }

    fn flush(&self) {}
}

/// `[LEVEL] message`, with the worker tag (`video:intro_1`) when a session
/// thread logged it.
fn format_line(level: log::Level, thread: Option<&str>, message: &str) -> String {
    match thread.and_then(|name| name.strip_prefix(WORKER_PREFIX)) {
        Some(worker) => format!("[{}] {} | {}", level, worker, message),
        None => format!("[{}] {}", level, message),
    }
}

static LOGGER: OnceLock<SharedLogger> = OnceLock::new();

/// Install the ring-buffer logger. Level comes from `RUST_LOG`; set
/// `REEL_LOG_STDERR` to anything but `0` to echo lines to stderr as well.
pub fn init() -> LogBuffer {
    let logger = LOGGER.get_or_init(|| SharedLogger {
        level: std::env::var("RUST_LOG")
            .map(|level| parse_level(&level))
            .unwrap_or(LevelFilter::Info),
        buffer: LogBuffer::default(),
        echo_stderr: std::env::var("REEL_LOG_STDERR")
            .map(|value| value != "0")
            .unwrap_or(false),
    });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level);
    }
    logger.buffer.clone()
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// Turn a libc `-1` into the current OS error.
fn check(result: libc::c_int) -> io::Result<libc::c_int> {
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(result)
    }
}

/// Puts the terminal's stderr back when dropped.
pub struct StderrCapture {
    saved: OwnedFd,
    reader: Option<JoinHandle<()>>,
}

impl Drop for StderrCapture {
    fn drop(&mut self) {
        // Replacing fd 2 closes the last write end, so the reader hits EOF.
        unsafe {
            libc::dup2(self.saved.as_raw_fd(), libc::STDERR_FILENO);
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

/// Route process stderr into the log buffer while the TUI owns the terminal.
/// The audio backend writes there directly and would tear the screen.
pub fn capture_stderr(buffer: LogBuffer) -> io::Result<StderrCapture> {
    let mut fds = [0; 2];
    check(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
    let read_end = unsafe { OwnedFd::from_raw_fd(fds[0]) };
    let write_end = unsafe { OwnedFd::from_raw_fd(fds[1]) };

    let saved = unsafe { OwnedFd::from_raw_fd(check(libc::dup(libc::STDERR_FILENO))?) };
    check(unsafe { libc::dup2(write_end.as_raw_fd(), libc::STDERR_FILENO) })?;
    drop(write_end);

    let reader = thread::Builder::new()
        .name("stderr-capture".to_string())
        .spawn(move || forward_lines(BufReader::new(File::from(read_end)), &buffer));
    match reader {
        Ok(reader) => Ok(StderrCapture {
            saved,
            reader: Some(reader),
        }),
        Err(err) => {
            unsafe {
                libc::dup2(saved.as_raw_fd(), libc::STDERR_FILENO);
            }
            Err(err)
        }
    }
}

/// Copy non-empty lines into `buffer` until EOF. Backends do not promise
/// UTF-8, so bytes are decoded lossily.
fn forward_lines(reader: impl BufRead, buffer: &LogBuffer) {
    for line in reader.split(b'\n') {
        let Ok(line) = line else { break };
        let text = String::from_utf8_lossy(&line);
        let text = text.trim_end();
        if !text.is_empty() {
            buffer.push(format!("[STDERR] {}", text));
        }
    }
}
