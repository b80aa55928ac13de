//! Logging utilities with colored output and a watch-mode status line.
//!
//! This module provides:
//! - [`Logger`], a cheap-to-clone handle passed to every long-lived component
//! - `log!` / `debug!` macros for formatted output with colored prefixes
//! - `WatchStatus` for single-block rebuild status in dev mode
//!
//! # Example
//!
//! ```ignore
//! let logger = Logger::new(verbose);
//! log!(logger, "pack"; "bundled {} pages", count);
//! debug!(logger, "watch"; "raw event: {}", path);
//! logger.status_success("rebuilt pages/home.jsx");
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::Arc,
};

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!(logger, "module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $module:expr; $($arg:tt)*) => {{
        $logger.log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only emitted when the logger is verbose)
///
/// # Usage
/// ```ignore
/// debug!(logger, "module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $module:expr; $($arg:tt)*) => {{
        if $logger.is_verbose() {
            $logger.log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Logger
// ============================================================================

/// Where log lines end up.
enum Sink {
    /// Colored output on stdout.
    Terminal,
    /// Dropped.
    Silent,
    /// Recorded in memory as `[module] message`.
    Capture(Mutex<Vec<String>>),
}

struct LoggerInner {
    verbose: bool,
    sink: Sink,
    status: Mutex<WatchStatus>,
}

/// Logging handle threaded through constructors.
///
/// Verbosity is a property of the handle, not of the process, so two sessions
/// in the same process can log at different levels.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// Terminal logger.
    pub fn new(verbose: bool) -> Self {
        Self::with_sink(verbose, Sink::Terminal)
    }

    /// Logger that discards everything.
    pub fn silent() -> Self {
        Self::with_sink(false, Sink::Silent)
    }

    /// Verbose logger that records every line in memory.
    pub fn capture() -> Self {
        Self::with_sink(true, Sink::Capture(Mutex::new(Vec::new())))
    }

    fn with_sink(verbose: bool, sink: Sink) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                verbose,
                sink,
                status: Mutex::new(WatchStatus::new()),
            }),
        }
    }

    /// Whether `debug!` output is emitted.
    #[inline]
    pub fn is_verbose(&self) -> bool {
        self.inner.verbose
    }

    /// Log a message with a colored module prefix.
    pub fn log(&self, module: &str, message: &str) {
        match &self.inner.sink {
            Sink::Terminal => write_terminal(module, message),
            Sink::Silent => {}
            Sink::Capture(lines) => lines.lock().push(format!("[{module}] {message}")),
        }
    }

    /// Lines recorded by a capture logger (empty for other sinks).
    pub fn lines(&self) -> Vec<String> {
        match &self.inner.sink {
            Sink::Capture(lines) => lines.lock().clone(),
            _ => Vec::new(),
        }
    }

    /// Watch status: success.
    pub fn status_success(&self, message: &str) {
        match &self.inner.sink {
            Sink::Terminal => self.inner.status.lock().success(message),
            _ => self.log("status", message),
        }
    }

    /// Watch status: error with detail.
    pub fn status_error(&self, summary: &str, detail: &str) {
        match &self.inner.sink {
            Sink::Terminal => self.inner.status.lock().error(summary, detail),
            _ => self.log("status", &format!("{summary}: {detail}")),
        }
    }

    /// Watch status: warning.
    pub fn status_warning(&self, detail: &str) {
        match &self.inner.sink {
            Sink::Terminal => self.inner.status.lock().warning(detail),
            _ => self.log("status", detail),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("verbose", &self.inner.verbose)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn write_terminal(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "dev" | "reload" => prefix.bright_blue().bold().to_string(),
        "watch" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch Status (single-line status with overwrite)
// ============================================================================

/// Current UTC time formatted as HH:MM:SS
fn now() -> String {
    use std::time::SystemTime;
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Single-block status display for watch mode
///
/// Each message overwrites the previous one, so a burst of rebuilds
/// leaves only the latest result on screen.
struct WatchStatus {
    /// Lines of previous output to clear
    last_lines: usize,
}

impl WatchStatus {
    const fn new() -> Self {
        Self { last_lines: 0 }
    }

    fn success(&mut self, message: &str) {
        self.display(format!("{}", "✓".green()), message);
    }

    fn error(&mut self, summary: &str, detail: &str) {
        let message = if detail.is_empty() {
            summary.to_string()
        } else {
            format!("{summary}\n{detail}")
        };
        self.display(format!("{}", "✗".red()), &message);
    }

    fn warning(&mut self, detail: &str) {
        self.display(format!("{}", "⚠".yellow()), detail);
    }

    fn display(&mut self, symbol: String, message: &str) {
        let mut stdout = stdout().lock();

        if self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = self.last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }

        let timestamp = format!("[{}]", now()).dimmed().to_string();
        writeln!(stdout, "{timestamp} {symbol} {message}").ok();
        stdout.flush().ok();

        self.last_lines = message.matches('\n').count() + 1;
    }
}
