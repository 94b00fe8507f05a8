use cadaster::config::Settings;
use cadaster::consts::DEFAULT_LOG_FILTER;
use cadaster::exceptions::CadasterError;
use cadaster::server::{self, AppState};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// Use jemalloc on musl x86_64 for better performance
#[cfg(all(target_env = "musl", target_arch = "x86_64"))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser)]
#[command(
    name = "cadaster",
    about = "Records cadastral queries confirmed by an external verification server",
    long_about = None,
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,
}

#[tokio::main]
async fn main() {
    // Variables already set in the environment win over `.env`.
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Error: failed to load .env: {}", e);
        std::process::exit(1);
    }
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli.settings).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(settings: Settings) -> Result<(), CadasterError> {
    let state = AppState::from_settings(&settings)?;
    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    server::serve(listener, state, shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}
