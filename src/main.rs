//! Keygate - HTTP daemon gating a user listing behind checksum credentials.

use std::env;
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use keygate::config::Settings;
use keygate::resource::UserDirectory;
use keygate::server::{AppState, HttpServer};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{} {}", NAME, VERSION);
        return ExitCode::SUCCESS;
    }

    let config_path = get_config_path(&args);
    let loaded = match &config_path {
        Some(path) => Settings::load(path),
        None => Settings::from_env(),
    };
    let settings = match loaded {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting {} v{}", NAME, VERSION);
    match &config_path {
        Some(path) => info!("Configuration loaded from: {}", path),
        None => info!("No configuration file given, using defaults"),
    }
    info!("Listen address: {}", settings.server.bind_addr);
    info!("Log level: {}", settings.logging.level);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async_main(settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Daemon failed");
            ExitCode::FAILURE
        }
    }
}

/// Async main function.
async fn async_main(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    // The user directory must be readable before we accept any request.
    let users = UserDirectory::load(&settings.resource.users_path)?;
    let state = AppState::from_settings(&settings, Arc::new(users))?;

    let server = HttpServer::bind(&settings.server, state).await?;
    info!(addr = %server.local_addr()?, "Listening");

    let shutdown = Arc::new(Notify::new());
    let mut server_task = tokio::spawn(server.run(Arc::clone(&shutdown)));

    tokio::select! {
        result = &mut server_task => {
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => Err(e.into()),
            };
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, initiating graceful shutdown...");
            shutdown.notify_one();
        }
    }

    let drain_timeout = settings.server.shutdown_timeout();
    match tokio::time::timeout(drain_timeout, server_task).await {
        Ok(Ok(Ok(()))) => info!("Graceful shutdown complete"),
        Ok(Ok(Err(e))) => error!(error = %e, "Server failed during shutdown"),
        Ok(Err(e)) => error!(error = %e, "Server task panicked"),
        Err(_) => warn!(
            "Shutdown timeout after {}s, some requests may be terminated",
            drain_timeout.as_secs()
        ),
    }

    info!("Shutting down");
    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print help message.
fn print_help() {
    println!(
        r#"{} {}
HTTP daemon that gates a user listing behind short-lived checksum credentials.

USAGE:
    {} [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file
                           [default: built-in defaults]
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT:
    LOG_FILE_LOCATION      Write logs to this file instead of stdout
    RUST_LOG               Override the configured log filter
"#,
        NAME, VERSION, NAME
    );
}

/// Get configuration file path from command line arguments.
fn get_config_path(args: &[String]) -> Option<String> {
    for (i, arg) in args.iter().enumerate() {
        if (arg == "--config" || arg == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    None
}

/// Initialize logging based on settings.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let (writer, ansi) = match &settings.logging.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(writer))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_ansi(ansi).with_writer(writer))
                .init();
        }
    }

    Ok(())
}
