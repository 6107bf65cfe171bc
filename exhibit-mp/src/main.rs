//! Exhibit Media Player (exhibit-mp) - Main entry point
//!
//! Startup order:
//! 1. Load configuration, start logging, build the clip catalog
//! 2. Start the operator console
//! 3. Open the controller tty and announce our protocol version
//! 4. Create the playback engine
//! 5. Start the scheduler thread, which puts the background loop on screen
//!
//! Each startup failure exits with its own code (see `Error::exit_code`).

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use exhibit_common::config::{resolve_config_path, EngineKind, LoggingConfig, TomlConfig};
use tokio::io::BufReader;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use exhibit_mp::commands::{CommandContext, CommandRegistry};
use exhibit_mp::controller::{self, ControllerLink};
use exhibit_mp::error::{Error, Result, EXIT_OK};
use exhibit_mp::playback::{Notifier, Scheduler, SchedulerConfig};
use exhibit_mp::{console, engine, SharedState};

/// Command-line arguments for exhibit-mp
#[derive(Parser, Debug)]
#[command(name = "exhibit-mp")]
#[command(about = "Clip player for the exhibit screen")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "EXHIBIT_MP_CONFIG")]
    config: Option<PathBuf>,

    /// Controller tty (overrides the config file)
    #[arg(long)]
    controller_tty: Option<PathBuf>,

    /// Run without an exhibit controller
    #[arg(long)]
    no_controller: bool,

    /// Use the simulated engine instead of VLC
    #[arg(long)]
    simulate: bool,

    /// Start in a window instead of fullscreen
    #[arg(long)]
    windowed: bool,
}

fn main() {
    let args = Args::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(source) => {
            let e = Error::ThreadSpawn { name: "runtime", source };
            eprintln!("exhibit-mp: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    let code = match runtime.block_on(run(args)) {
        Ok(()) => EXIT_OK,
        Err(e) => {
            error!("{}", e);
            eprintln!("exhibit-mp: {}", e);
            e.exit_code()
        }
    };

    // The stdin reader may still be parked in a blocking read
    runtime.shutdown_timeout(Duration::from_millis(500));
    std::process::exit(code);
}

async fn run(args: Args) -> Result<()> {
    let config_path = resolve_config_path(args.config.as_deref())?;
    let mut config = TomlConfig::load(&config_path)?;
    if args.simulate {
        config.engine.kind = EngineKind::Simulated;
    }
    if let Some(tty) = args.controller_tty {
        config.controller_tty = tty;
    }
    if args.windowed {
        config.fullscreen = false;
    }

    init_tracing(&config.logging)?;

    println!(
        "Exhibit Media Player v{} ({} {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );
    println!("Type \"help\" for list of commands");
    info!("Configuration: {:?}", config_path);

    let catalog = Arc::new(config.build_catalog()?);
    info!("Catalog: {} clips", catalog.count());

    let state = Arc::new(SharedState::new());
    let (link, outbound) = ControllerLink::channel();
    let notifier = Notifier::new(link);
    let ctx = Arc::new(CommandContext {
        catalog: Arc::clone(&catalog),
        state: Arc::clone(&state),
        notifier: notifier.clone(),
    });
    let console_registry = Arc::new(CommandRegistry::console()?);
    let controller_registry = Arc::new(CommandRegistry::controller()?);

    // Operator console
    let console_task = tokio::spawn(console::run_console(
        BufReader::new(tokio::io::stdin()),
        console_registry,
        Arc::clone(&ctx),
    ));

    // Exhibit controller
    let (writer_task, reader_task) = if args.no_controller {
        warn!("Running without an exhibit controller");
        let writer = tokio::spawn(controller::run_writer(outbound, tokio::io::sink()));
        (writer, None)
    } else {
        let (reader, writer) = controller::open(&config.controller_tty).await?;
        let writer = tokio::spawn(controller::run_writer(outbound, writer));
        let reader = tokio::spawn(controller::run_reader(
            BufReader::new(reader),
            controller_registry,
            Arc::clone(&ctx),
        ));
        (writer, Some(reader))
    };
    notifier.notify_version();

    // Playback engine and scheduler
    let engine = engine::create_engine(&config, &catalog)?;
    let scheduler = Scheduler::new(
        Arc::clone(&catalog),
        Arc::clone(&state),
        engine,
        notifier,
        SchedulerConfig::from_toml(&config),
    );

    let (done_tx, mut done_rx) = tokio::sync::oneshot::channel();
    std::thread::Builder::new()
        .name("scheduler".to_string())
        .spawn(move || {
            let _ = done_tx.send(scheduler.run());
        })
        .map_err(|source| Error::ThreadSpawn {
            name: "scheduler",
            source,
        })?;

    info!("Media player initialized and running");

    let finished = tokio::select! {
        result = &mut done_rx => result,
        _ = shutdown_signal() => {
            state.request_stop();
            done_rx.await
        }
    };
    let result = finished
        .unwrap_or_else(|_| Err(Error::PlaybackStart("scheduler thread panicked".to_string())));

    console_task.abort();
    if let Some(reader) = reader_task {
        reader.abort();
    }
    drop(ctx);
    // Let queued controller lines drain
    if tokio::time::timeout(Duration::from_millis(200), writer_task)
        .await
        .is_err()
    {
        warn!("Controller writer did not drain before shutdown");
    }

    info!("Media player stopped");
    result
}

/// Initialize tracing from `RUST_LOG`, falling back to the config file level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "exhibit_mp={level},exhibit_common={level}",
            level = logging.level
        ))
    });
    let registry = tracing_subscriber::registry().with(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    exhibit_common::Error::Config(format!("cannot open log file {:?}: {}", path, e))
                })?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
