use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use resmon::collectors::SystemCollector;
use resmon::sampler::Sampler;
use resmon::view;

#[derive(Parser)]
#[command(name = "resmon", version, about = "Periodic host resource monitor")]
struct Args {
    /// Sampling interval in milliseconds (must be greater than zero).
    #[arg(long, default_value_t = 1000)]
    interval: u64,

    /// Emit one JSON object per sample instead of the console view.
    #[arg(long)]
    json: bool,

    /// Append diagnostic logs to this file. Without it, logs go to stderr,
    /// which the console view will overwrite.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_file.as_deref());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "fatal error");
            eprintln!("resmon: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))?;

    let sampler = Sampler::new(Box::new(SystemCollector::new()));
    sampler.set_interval(args.interval)?;

    if args.json {
        sampler.set_observer(|snap| match serde_json::to_string(snap) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(error = %err, "failed to serialize snapshot"),
        });
    } else {
        sampler.set_observer(|snap| {
            let mut out = io::stdout();
            if let Err(err) = view::render(&mut out, snap) {
                warn!(error = %err, "failed to render snapshot");
            }
        });
    }

    sampler.start();
    info!(interval_ms = args.interval, "monitoring started, press Ctrl+C to stop");

    // Signal delivery only flips the flag; the actual teardown happens
    // here, outside any handler context.
    while !shutdown.load(Ordering::Relaxed) && sampler.is_running() {
        thread::sleep(Duration::from_millis(100));
    }

    sampler.stop();
    info!("monitoring stopped");
    Ok(())
}

fn init_logging(log_file: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file = path.file_name().unwrap_or_else(|| OsStr::new("resmon.log"));
            let appender = tracing_appender::rolling::never(dir, file);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
            None
        }
    }
}
