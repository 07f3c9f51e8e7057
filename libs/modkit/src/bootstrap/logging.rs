use super::config::LoggingConfig;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use file_rotate::{
    ContentLimit, FileRotate,
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
};

// Keep a guard for non-blocking console to avoid being dropped.
static CONSOLE_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

const MB: u64 = 1024 * 1024;

// ================= rotating writer for files =================

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl<'a> fmt::MakeWriter<'a> for RotWriter {
    type Writer = RotWriterHandle;
    fn make_writer(&'a self) -> Self::Writer {
        RotWriterHandle(self.0.clone())
    }
}

struct RotWriterHandle(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl RotWriterHandle {
    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, FileRotate<AppendTimestamp>>> {
        self.0
            .lock()
            .map_err(|e| io::Error::other(format!("Lock failed: {e}")))
    }
}

impl Write for RotWriterHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.flush()
    }
}

/// Resolve the log file against `base_dir` unless it is already absolute.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn create_rotating_writer(cfg: &LoggingConfig, log_path: &Path) -> io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_bytes = usize::try_from(cfg.max_size_mb.unwrap_or(100).saturating_mul(MB))
        .unwrap_or(usize::MAX);
    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(FileLimit::MaxFiles(cfg.max_backups.unwrap_or(3))),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

/// Console filter: `RUST_LOG` wins when set, otherwise the configured level.
fn console_filter(cfg: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from(cfg.console_level).into())
    })
}

/// Install the global `tracing` subscriber: console sink plus an optional rotating file.
///
/// Safe to call more than once; later calls keep the first subscriber.
#[allow(clippy::print_stderr)] // runs before tracing subscriber is installed
pub fn init_logging(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` *before* installing the subscriber
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("LogTracer init skipped: {e}");
    }

    let (console_writer, guard) = tracing_appender::non_blocking(io::stdout());
    let _ = CONSOLE_GUARD.set(guard);

    let console_layer = fmt::layer()
        .with_writer(console_writer)
        .with_target(true)
        .with_filter(console_filter(cfg));

    let file_layer = cfg.file().and_then(|file| {
        let path = resolve_log_path(file, base_dir);
        match create_rotating_writer(cfg, &path) {
            Ok(writer) => Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(LevelFilter::from(cfg.file_level)),
            ),
            Err(e) => {
                eprintln!("Log file {} disabled: {e}", path.display());
                None
            }
        }
    });

    if let Err(e) = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Logging already initialized: {e}");
    }
}
