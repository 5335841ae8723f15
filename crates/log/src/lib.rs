//! Process-wide leveled logging for the asset layer.
//!
//! Output goes to stderr as text or JSON lines. Tests can switch stderr off and
//! read records back from a bounded in-memory capture ring.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::json;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Level {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    Text = 0,
    Json = 1,
}

impl Format {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn from_u8(raw: u8) -> Self {
        if raw == Self::Json as u8 {
            Self::Json
        } else {
            Self::Text
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LogConfig {
    pub level: Level,
    pub format: Format,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Text,
            timestamps: true,
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static LOG_FORMAT: AtomicU8 = AtomicU8::new(Format::Text as u8);
static LOG_TIMESTAMPS: AtomicBool = AtomicBool::new(true);
static LOG_STDERR_ENABLED: AtomicBool = AtomicBool::new(true);

#[derive(Clone, Debug)]
pub struct CapturedLog {
    pub ts_ms: u64,
    pub level: Level,
    pub target: &'static str,
    pub file: &'static str,
    pub line: u32,
    pub msg: String,
}

static LOG_CAPTURE_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_CAPTURE_CAPACITY: AtomicUsize = AtomicUsize::new(0);
static LOG_CAPTURE: OnceLock<Mutex<VecDeque<CapturedLog>>> = OnceLock::new();

pub fn init(config: LogConfig) {
    LOG_LEVEL.store(config.level as u8, Ordering::Relaxed);
    LOG_FORMAT.store(config.format as u8, Ordering::Relaxed);
    LOG_TIMESTAMPS.store(config.timestamps, Ordering::Relaxed);
}

pub fn set_stderr_enabled(enabled: bool) {
    LOG_STDERR_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Starts keeping the most recent `capacity` records in memory.
pub fn enable_capture(capacity: usize) {
    if capacity == 0 {
        disable_capture();
        return;
    }
    LOG_CAPTURE_CAPACITY.store(capacity, Ordering::Relaxed);
    LOG_CAPTURE.get_or_init(|| Mutex::new(VecDeque::with_capacity(capacity.min(1024))));
    LOG_CAPTURE_ENABLED.store(true, Ordering::Relaxed);
}

pub fn disable_capture() {
    LOG_CAPTURE_ENABLED.store(false, Ordering::Relaxed);
}

pub fn clear_captured_logs() {
    if let Some(Ok(mut ring)) = LOG_CAPTURE.get().map(Mutex::lock) {
        ring.clear();
    }
}

/// Returns up to `limit` of the newest captured records, oldest first.
pub fn capture_snapshot(limit: usize) -> Vec<CapturedLog> {
    let Some(Ok(ring)) = LOG_CAPTURE.get().map(Mutex::lock) else {
        return Vec::new();
    };
    let skip = ring.len().saturating_sub(limit);
    ring.iter().skip(skip).cloned().collect()
}

pub fn enabled(level: Level) -> bool {
    level as u8 <= LOG_LEVEL.load(Ordering::Relaxed)
}

pub fn log(
    level: Level,
    target: &'static str,
    file: &'static str,
    line: u32,
    args: fmt::Arguments<'_>,
) {
    if !enabled(level) {
        return;
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let ts_ms: u64 = now.as_millis().try_into().unwrap_or(u64::MAX);
    let capturing = LOG_CAPTURE_ENABLED.load(Ordering::Relaxed);
    let format = Format::from_u8(LOG_FORMAT.load(Ordering::Relaxed));

    if LOG_STDERR_ENABLED.load(Ordering::Relaxed) {
        let mut out = io::stderr().lock();
        let _ = match format {
            Format::Text => write_text(&mut out, now, level, target, args),
            Format::Json => {
                let line = json!({
                    "ts_ms": ts_ms,
                    "level": level.as_str(),
                    "target": target,
                    "file": file,
                    "line": line,
                    "msg": args.to_string(),
                });
                writeln!(out, "{line}")
            }
        };
    }

    if capturing {
        push_capture(CapturedLog {
            ts_ms,
            level,
            target,
            file,
            line,
            msg: args.to_string(),
        });
    }
}

fn write_text(
    out: &mut impl Write,
    now: Duration,
    level: Level,
    target: &str,
    args: fmt::Arguments<'_>,
) -> io::Result<()> {
    if LOG_TIMESTAMPS.load(Ordering::Relaxed) {
        let ts = Timestamp {
            unix_seconds: now.as_secs(),
            millis: now.subsec_millis(),
        };
        write!(out, "{ts} ")?;
    }
    writeln!(out, "{} {}: {args}", level.as_str(), target)
}

fn push_capture(record: CapturedLog) {
    let Some(Ok(mut ring)) = LOG_CAPTURE.get().map(Mutex::lock) else {
        return;
    };
    let cap = LOG_CAPTURE_CAPACITY.load(Ordering::Relaxed);
    if cap == 0 {
        return;
    }
    ring.push_back(record);
    while ring.len() > cap {
        ring.pop_front();
    }
}

#[macro_export]
macro_rules! log_at {
    ($level:expr, $($arg:tt)*) => {{
        if $crate::enabled($level) {
            $crate::log($level, module_path!(), file!(), line!(), format_args!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Error, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Warn, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Info, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Debug, $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        $crate::log_at!($crate::Level::Trace, $($arg)*);
    }};
}

struct Timestamp {
    unix_seconds: u64,
    millis: u32,
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SECS_PER_DAY: u64 = 86_400;
        let days = (self.unix_seconds / SECS_PER_DAY) as i64;
        let secs_of_day = self.unix_seconds % SECS_PER_DAY;
        let (year, month, day) = civil_from_days(days);
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
            secs_of_day / 3600,
            (secs_of_day % 3600) / 60,
            secs_of_day % 60,
            self.millis
        )
    }
}

// Howard Hinnant's days-to-civil conversion (public domain).
fn civil_from_days(days_since_unix_epoch: i64) -> (i32, u32, u32) {
    let z = days_since_unix_epoch + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = (yoe as i32) + (era as i32) * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    (y + i32::from(m <= 2), m, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level() {
        assert_eq!(Level::parse("info"), Some(Level::Info));
        assert_eq!(Level::parse(" WARN "), Some(Level::Warn));
        assert_eq!(Level::parse("warning"), Some(Level::Warn));
        assert_eq!(Level::parse("trace"), Some(Level::Trace));
        assert_eq!(Level::parse("verbose"), None);
    }

    #[test]
    fn parse_format() {
        assert_eq!(Format::parse("text"), Some(Format::Text));
        assert_eq!(Format::parse("JSON"), Some(Format::Json));
        assert_eq!(Format::parse("yaml"), None);
        assert_eq!(Format::from_u8(7), Format::Text);
    }

    #[test]
    fn timestamp_renders_utc() {
        let ts = Timestamp {
            unix_seconds: 1_739_836_801,
            millis: 42,
        };
        assert_eq!(ts.to_string(), "2025-02-18T00:00:01.042Z");
    }

    #[test]
    fn civil_dates_around_epoch() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(-1), (1969, 12, 31));
        assert_eq!(civil_from_days(59), (1970, 3, 1));
    }
}
