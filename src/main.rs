//! treemirror command-line interface.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::Layer as _;

use treemirror::{Config, LocalFs, TracingLog};

/// Make REPLICA an exact copy of SOURCE, one way.
#[derive(Parser, Debug)]
#[command(name = "treemirror", version, about)]
struct Cli {
    /// Directory to mirror from
    #[arg(env = "TREEMIRROR_SOURCE")]
    source: PathBuf,

    /// Directory to mirror into (created if missing)
    #[arg(env = "TREEMIRROR_REPLICA")]
    replica: PathBuf,

    /// Append info, warnings and errors to this file
    #[arg(long, env = "TREEMIRROR_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Copy ownership and permissions onto the replica (needs root)
    #[arg(long)]
    permissions: bool,

    /// Show every decision on the terminal, not just changes
    #[arg(short, long)]
    verbose: bool,

    /// Also write verbose events to the log file
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut builder = treemirror::mirror()
        .source(&cli.source)
        .replica(&cli.replica)
        .sync_permissions(cli.permissions)
        .debug(cli.debug);
    if let Some(path) = &cli.log_file {
        builder = builder.log_file(path);
    }

    let config = match builder.build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match init_logging(&config, cli.verbose) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: cannot open log file: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        source = %config.source_root.display(),
        replica = %config.replica_root.display(),
        permissions = config.sync_permissions,
        "Starting mirror"
    );

    match treemirror::engine::run(&config, &LocalFs, &TracingLog) {
        Ok(report) => {
            tracing::info!("Finished: {report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Aborted: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Terminal layer plus, when configured, a file layer.
///
/// The terminal shows `INFO` and up, or `DEBUG` with `--verbose`. The file
/// gets `INFO` and up, or `DEBUG` in debug mode, so verbose events are only
/// persisted when asked for.
fn init_logging(config: &Config, verbose: bool) -> std::io::Result<Option<WorkerGuard>> {
    let console_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_level);

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let (dir, name) = split_log_path(path);
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let file_level = if config.debug { LevelFilter::DEBUG } else { LevelFilter::INFO };
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(file_level);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,treemirror=trace"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("treemirror.log"));
    (dir, name)
}
