//! Logging initialization using the `tracing` ecosystem.
//!
//! Console and optional daily-rotated file output both go through
//! `tracing-appender`'s non-blocking writers, so emitting a log line never
//! waits on terminal or disk I/O inside a connection task.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the background log writers alive. Buffered lines are flushed when
/// this is dropped, so hold it until the program exits.
#[must_use = "dropping the guard stops log output"]
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// Filter used when `RUST_LOG` is unset. An unparsable level falls back to `info`.
pub fn level_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// - `log_level`: default level if `RUST_LOG` is not set (e.g. `"info"`)
/// - `log_dir`: optional directory for daily-rotating log files
/// - `module_name`: log file prefix (e.g. `"krec-runner"`)
pub fn init_logging(log_level: &str, log_dir: Option<&str>, module_name: &str) -> LogGuard {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(log_level));

    let (stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let console_layer = fmt::layer()
        .with_writer(stdout)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(true);

    let mut guards = vec![stdout_guard];

    if let Some(dir) = log_dir {
        let (file, file_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, module_name));
        guards.push(file_guard);
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
    }

    LogGuard { _guards: guards }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_filter_accepts_directives_and_falls_back() {
        use tracing_subscriber::filter::LevelFilter;

        assert_eq!(level_filter("debug").max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(level_filter("krec_md=trace").max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(level_filter("krec_md=loud").max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn non_blocking_writer_flushes_on_guard_drop() {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Sink(Arc<Mutex<Vec<u8>>>);
        impl Write for Sink {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let sink = Sink::default();
        let (writer, guard) = tracing_appender::non_blocking(sink.clone());
        let subscriber = tracing_subscriber::registry()
            .with(level_filter("info"))
            .with(fmt::layer().with_writer(writer).with_ansi(false));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("worker started");
            tracing::debug!("filtered out");
        });
        drop(LogGuard { _guards: vec![guard] });

        let out = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("worker started"));
        assert!(!out.contains("filtered out"));
    }
}
