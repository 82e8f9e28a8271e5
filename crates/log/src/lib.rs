//! Process-wide leveled logger for the wallet crates.
//!
//! Lines go to stderr and optionally to an append-only file. The level filter
//! takes a default plus per-module overrides, e.g. `info,litewallet::sync=debug`.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
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

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Error,
            2 => Self::Warn,
            4 => Self::Debug,
            5 => Self::Trace,
            _ => Self::Info,
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
}

/// Level override for one module path and everything below it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Directive {
    pub target: String,
    pub level: Level,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Filter {
    pub default: Level,
    pub directives: Vec<Directive>,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl Filter {
    pub fn new(default: Level) -> Self {
        Self {
            default,
            directives: Vec::new(),
        }
    }

    /// Parses `level` or `level,target=level,...`. A bare level anywhere sets the default.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut filter = Filter::default();
        for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            match part.split_once('=') {
                Some((target, level)) => {
                    let target = target.trim();
                    if target.is_empty() {
                        return None;
                    }
                    filter.directives.push(Directive {
                        target: target.to_string(),
                        level: Level::parse(level)?,
                    });
                }
                None => filter.default = Level::parse(part)?,
            }
        }
        Some(filter)
    }

    /// Most specific directive matching `target` on a `::` boundary, else the default.
    pub fn level_for(&self, target: &str) -> Level {
        self.directives
            .iter()
            .filter(|directive| matches_target(&directive.target, target))
            .max_by_key(|directive| directive.target.len())
            .map_or(self.default, |directive| directive.level)
    }

    fn max_level(&self) -> Level {
        self.directives
            .iter()
            .map(|directive| directive.level)
            .fold(self.default, Level::max)
    }
}

fn matches_target(prefix: &str, target: &str) -> bool {
    match target.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub filter: Filter,
    pub format: Format,
    pub timestamps: bool,
    /// Append log lines to this file in addition to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: Filter::default(),
            format: Format::Text,
            timestamps: true,
            file: None,
        }
    }
}

/// Upper bound over all directives, checked by the macros before formatting.
static MAX_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static DIRECTIVES: Mutex<Vec<Directive>> = Mutex::new(Vec::new());
static DEFAULT_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);
static LOG_FORMAT: AtomicU8 = AtomicU8::new(Format::Text as u8);
static LOG_TIMESTAMPS: AtomicBool = AtomicBool::new(true);
static LOG_STDERR_ENABLED: AtomicBool = AtomicBool::new(true);
static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);

/// A log line kept in the in-memory ring buffer.
#[derive(Clone, Debug)]
pub struct CapturedLog {
    pub ts_ms: u64,
    pub level: Level,
    pub target: &'static str,
    pub msg: String,
}

static CAPTURE_ENABLED: AtomicBool = AtomicBool::new(false);
static CAPTURE_CAPACITY: AtomicUsize = AtomicUsize::new(0);
static CAPTURE: OnceLock<Mutex<VecDeque<CapturedLog>>> = OnceLock::new();

/// Installs `config` process-wide. Fails only if the log file cannot be opened.
pub fn init(config: LogConfig) -> io::Result<()> {
    let file = config.file.as_deref().map(open_log_file).transpose()?;
    if let Ok(mut slot) = LOG_FILE.lock() {
        *slot = file;
    }
    if let Ok(mut directives) = DIRECTIVES.lock() {
        *directives = config.filter.directives.clone();
    }
    DEFAULT_LEVEL.store(config.filter.default as u8, Ordering::Relaxed);
    MAX_LEVEL.store(config.filter.max_level() as u8, Ordering::Relaxed);
    LOG_FORMAT.store(config.format as u8, Ordering::Relaxed);
    LOG_TIMESTAMPS.store(config.timestamps, Ordering::Relaxed);
    Ok(())
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

pub fn set_stderr_enabled(enabled: bool) {
    LOG_STDERR_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Keeps the most recent `capacity` lines in memory; zero turns capture off.
pub fn enable_capture(capacity: usize) {
    if capacity == 0 {
        CAPTURE_ENABLED.store(false, Ordering::Relaxed);
        return;
    }
    CAPTURE_CAPACITY.store(capacity, Ordering::Relaxed);
    CAPTURE.get_or_init(|| Mutex::new(VecDeque::with_capacity(capacity.min(1024))));
    CAPTURE_ENABLED.store(true, Ordering::Relaxed);
}

pub fn captured(limit: usize) -> Vec<CapturedLog> {
    let Some(buf) = CAPTURE.get() else {
        return Vec::new();
    };
    let Ok(guard) = buf.lock() else {
        return Vec::new();
    };
    let start = guard.len().saturating_sub(limit);
    guard.iter().skip(start).cloned().collect()
}

/// Cheap pre-check used by the macros; `log` applies the per-target filter.
pub fn enabled(level: Level) -> bool {
    level as u8 <= MAX_LEVEL.load(Ordering::Relaxed)
}

fn level_for(target: &str) -> Level {
    let default = Level::from_u8(DEFAULT_LEVEL.load(Ordering::Relaxed));
    let Ok(directives) = DIRECTIVES.lock() else {
        return default;
    };
    directives
        .iter()
        .filter(|directive| matches_target(&directive.target, target))
        .max_by_key(|directive| directive.target.len())
        .map_or(default, |directive| directive.level)
}

pub fn log(
    level: Level,
    target: &'static str,
    file: &'static str,
    line: u32,
    args: fmt::Arguments<'_>,
) {
    if level > level_for(target) {
        return;
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let ts_ms: u64 = now.as_millis().try_into().unwrap_or(u64::MAX);
    let msg = args.to_string();
    let rendered = match LOG_FORMAT.load(Ordering::Relaxed) {
        1 => json!({
            "ts_ms": ts_ms,
            "level": level.as_str(),
            "target": target,
            "file": file,
            "line": line,
            "msg": msg,
        })
        .to_string(),
        _ => render_text(now, level, target, &msg),
    };

    if LOG_STDERR_ENABLED.load(Ordering::Relaxed) {
        let _ = writeln!(io::stderr().lock(), "{rendered}");
    }
    if let Ok(mut slot) = LOG_FILE.lock() {
        if let Some(out) = slot.as_mut() {
            let _ = writeln!(out, "{rendered}");
        }
    }
    if CAPTURE_ENABLED.load(Ordering::Relaxed) {
        push_captured(CapturedLog {
            ts_ms,
            level,
            target,
            msg,
        });
    }
}

fn render_text(now: Duration, level: Level, target: &str, msg: &str) -> String {
    if LOG_TIMESTAMPS.load(Ordering::Relaxed) {
        let ts = Timestamp {
            unix_seconds: now.as_secs(),
            millis: now.subsec_millis(),
        };
        format!("{ts} {} {target}: {msg}", level.as_str())
    } else {
        format!("{} {target}: {msg}", level.as_str())
    }
}

fn push_captured(entry: CapturedLog) {
    let Some(buf) = CAPTURE.get() else {
        return;
    };
    let Ok(mut guard) = buf.lock() else {
        return;
    };
    let cap = CAPTURE_CAPACITY.load(Ordering::Relaxed);
    guard.push_back(entry);
    while guard.len() > cap {
        guard.pop_front();
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

// Howard Hinnant's days-to-civil conversion.
fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
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
    fn parse_level_and_format() {
        assert_eq!(Level::parse("info"), Some(Level::Info));
        assert_eq!(Level::parse("WARNING"), Some(Level::Warn));
        assert_eq!(Level::parse("nope"), None);
        assert_eq!(Format::parse("JSON"), Some(Format::Json));
        assert_eq!(Format::parse("xml"), None);
    }

    #[test]
    fn filter_picks_most_specific_target() {
        let filter = Filter::parse("warn, litewallet=info, litewallet::sync=trace").expect("filter");
        assert_eq!(filter.default, Level::Warn);
        assert_eq!(filter.level_for("litewallet::sync"), Level::Trace);
        assert_eq!(filter.level_for("litewallet::sync::tests"), Level::Trace);
        assert_eq!(filter.level_for("litewallet::api"), Level::Info);
        assert_eq!(filter.level_for("litewallet_script"), Level::Warn);
        assert_eq!(filter.max_level(), Level::Trace);

        assert_eq!(Filter::parse("debug"), Some(Filter::new(Level::Debug)));
        assert_eq!(Filter::parse("litewallet=loud"), None);
        assert_eq!(Filter::parse("=info"), None);
    }

    #[test]
    fn timestamp_renders_utc() {
        let ts = Timestamp {
            unix_seconds: 1_700_000_000,
            millis: 7,
        };
        assert_eq!(ts.to_string(), "2023-11-14T22:13:20.007Z");
    }

    // Sinks are process-wide, so they are exercised in one test.
    #[test]
    fn sinks_honour_filter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("wallet.log");
        init(LogConfig {
            filter: Filter::parse("info,litewallet_log::tests=debug").expect("filter"),
            format: Format::Text,
            timestamps: false,
            file: Some(path.clone()),
        })
        .expect("init");
        set_stderr_enabled(false);
        enable_capture(2);

        log_debug!("first");
        log_trace!("hidden");
        log_warn!("second");
        log_info!("third");

        let messages: Vec<String> = captured(10).into_iter().map(|entry| entry.msg).collect();
        assert_eq!(messages, vec!["second".to_string(), "third".to_string()]);

        let written = fs::read_to_string(&path).expect("log file");
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines,
            vec![
                "DEBUG litewallet_log::tests: first",
                "WARN litewallet_log::tests: second",
                "INFO litewallet_log::tests: third",
            ]
        );

        init(LogConfig::default()).expect("reset");
    }
}
