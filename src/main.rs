use anyhow::{Context, Result};
use dyncrab::api::AppState;
use dyncrab::config::SHUTDOWN_GRACE;
use dyncrab::{Authenticator, Config, CredentialStore, ProviderRegistry};
use is_terminal::IsTerminal;
use std::process::ExitCode;
use tokio::signal;
use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_init();

    match run().await {
        Ok(()) => {
            tracing::info!("goodbye");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    tracing::debug!(?config, "loaded config from environment");

    let store = CredentialStore::load(&config.auth_config)?;
    if store.is_empty() {
        tracing::warn!("no users configured, every update will be rejected");
    }
    let provider = ProviderRegistry::with_builtin()
        .create(&config.provider, &|name: &str| std::env::var(name).ok())
        .with_context(|| format!("error initializing provider \"{}\"", config.provider))?;
    let state = AppState::new(Authenticator::new(store), provider, config.ttl);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let api_server = dyncrab::new_http(config.bind_addr(), state, async {
        // A dropped sender also means shut down.
        let _ = shutdown_rx.await;
    })
    .with_context(|| format!("can't listen on {}", config.bind_addr()))?;

    tracing::info!(
        addr = %config.bind_addr(),
        provider = %config.provider,
        ttl = config.ttl.as_secs(),
        "starting dyncrab"
    );
    let mut api_handle = tokio::spawn(api_server);

    tokio::select! {
        () = shutdown_signal() => {
            tracing::info!("shutting down server...");
        },
        api_res = &mut api_handle => {
            return Ok(api_res??);
        }
    }

    let _ = shutdown_tx.send(());
    match tokio::time::timeout(SHUTDOWN_GRACE, api_handle).await {
        Ok(api_res) => api_res??,
        Err(_) => tracing::error!("server forced to shutdown after {SHUTDOWN_GRACE:?}"),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("can't listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("can't listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

fn tracing_init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dyncrab=info,tower_http=info".into());

    // Plain text for humans, JSON lines when running under a supervisor or in a container.
    if std::io::stdout().is_terminal() {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json())
            .with(filter)
            .init();
    }
}
