#[macro_use]
extern crate tracing;

mod logging;

use eyre::{
    Context as _,
    Result,
};
pub use instagram_exporter_config::{
    Args,
    Config,
};
use instagram_exporter_collector::{
    login_client,
    resolve_session,
    Fetcher,
    HttpUpstream,
    Identity,
    Scheduler,
    SessionStash,
    SnapshotCollector,
};
use instagram_exporter_http::{
    create_router,
    serve,
    AppState,
};
pub use logging::{
    init_errors,
    init_logging,
};
use prometheus::Registry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Resolve the session, warm the snapshot up, then serve scrapes until a
/// shutdown signal arrives or the refresh loop fails.
pub async fn run(config: Config) -> Result<()> {
    let identities = config
        .identities
        .iter()
        .map(|name| Identity::from(name.trim()))
        .collect::<Vec<_>>();

    let client = login_client(config.request_timeout).wrap_err("failed to build login HTTP client")?;
    let stash = SessionStash::new(config.token_path());
    let session = resolve_session(&client, &config.upstream_url, &stash, config.credentials()).await?;
    info!(username = session.username, "authenticated");

    let upstream = HttpUpstream::new(config.upstream_url.clone(), &session, config.request_timeout)?;
    let scheduler = Scheduler::new(
        Fetcher::new(Arc::new(upstream)),
        identities,
        config.refresh_interval,
        config.on_fetch_error,
    );

    let registry = Registry::new();
    registry.register(Box::new(SnapshotCollector::new(
        config.namespace.clone(),
        scheduler.store(),
    )?))?;
    let router = create_router(AppState {
        registry,
        scheduler: scheduler.state(),
        metrics_path: config.metrics_path.clone(),
    });

    let shutdown = CancellationToken::new();
    let handle = tokio::select! {
        started = scheduler.start(shutdown.clone()) => started?,
        signal = shutdown_signal() => {
            signal?;
            info!("shutdown requested during warm-up");
            return Ok(());
        }
    };

    let mut server = tokio::spawn(serve(config.listen_address, router, shutdown.clone()));
    let refresh = handle.join();
    tokio::pin!(refresh);

    let outcome = tokio::select! {
        result = &mut refresh => result,
        served = &mut server => match served.wrap_err("HTTP server panicked") {
            Ok(Ok(())) => Err(eyre::eyre!("HTTP server stopped unexpectedly")),
            Ok(Err(err)) | Err(err) => Err(err),
        },
        signal = shutdown_signal() => {
            signal?;
            info!("shutdown requested");
            Ok(())
        }
    };

    shutdown.cancel();
    if !server.is_finished() {
        server.await.wrap_err("HTTP server panicked")??;
    }
    outcome
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {},
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;
    Ok(())
}
