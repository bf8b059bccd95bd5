use clap::Parser;
use log::{error, info, warn};
use rg_status::config::resolve_descriptors;
use rg_status::core::{Emitter, Registry};
use rg_status::{builtin_registry, Aggregator};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal::unix::{signal, SignalKind};

/// rg-status - status line for i3bar and swaybar
#[derive(Parser, Debug, Clone)]
#[command(name = "rg-status")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,

    /// List available producers and their options, then exit
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Producers to show, in order: TYPE[:KEY=VALUE ...]
    #[arg(value_name = "DESCRIPTOR")]
    descriptors: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    warn!("Starting rg-status v{}", env!("CARGO_PKG_VERSION"));

    let registry = builtin_registry();

    if cli.list {
        print_producers(&registry);
        return ExitCode::SUCCESS;
    }

    let started = resolve_descriptors(&cli.descriptors, cli.config.as_deref())
        .and_then(|descriptors| Aggregator::start(&registry, &descriptors));
    let (mut aggregator, rx) = match started {
        Ok(started) => started,
        Err(e) => {
            eprintln!("rg-status: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };
    info!(
        "Running {} producers: {}",
        aggregator.len(),
        aggregator.worker_names().collect::<Vec<_>>().join(", ")
    );

    let shutdown = match shutdown_signal() {
        Ok(shutdown) => shutdown,
        Err(e) => {
            eprintln!("rg-status: installing signal handlers: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut emitter = Emitter::new(io::stdout().lock());
    let result = emitter.run(rx, shutdown).await;
    aggregator.stop();

    match result {
        Ok(written) => {
            info!("Stopped after {} status lines", written);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Writing status line failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Resolves on the first SIGINT or SIGTERM
///
/// Handlers are installed here, before any output is written.
fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(async move {
        tokio::select! {
            _ = terminate.recv() => info!("Received SIGTERM"),
            _ = interrupt.recv() => info!("Received SIGINT"),
        }
    })
}

fn print_producers(registry: &Registry) {
    for info in registry.list() {
        println!("{} - {}", info.id, info.description);
        for line in info.options_help().lines() {
            println!("    {}", line);
        }
    }
}
