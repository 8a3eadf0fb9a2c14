use std::{future::IntoFuture as _, io, sync::OnceLock};

use application::{server, Args, Config};
use futures::TryFutureExt as _;
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    init_logging();

    _ = start().await;
}

/// Installs stdout and stderr log writers, filtered by [`LOG_LEVEL`].
fn init_logging() {
    let enabled = |meta: &log::Metadata<'_>, stderr: bool| {
        meta.is_span()
            || STDERR_LEVELS.contains(meta.level()) == stderr
                && LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO)
                    >= *meta.level()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(move |meta| enabled(meta, false))),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(move |meta| enabled(meta, true))),
        )
        .init();
}

async fn start() -> Result<(), ()> {
    let Args { config, check } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        server,
        log,
    } = Config::new(&config).map_err(|e| {
        log::error!("failed to load `Config` from `{config}`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let service_config = service::Config::try_from(service).map_err(|e| {
        log::error!("invalid `service` configuration: {e}");
    })?;

    if check {
        log::info!("`Config` from `{config}` is valid");
        return Ok(());
    }

    let postgres_config = postgres.into();
    let mut postgres = Postgres::new(&postgres_config).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;

    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;

    let service = Service::new(service_config, postgres);
    let app = server::router(service, &server.cors).map_err(|e| {
        log::error!("invalid CORS origin: {e}");
    })?;

    let listener = TcpListener::bind((server.host.clone(), server.port))
        .await
        .map_err(|e| {
            log::error!(
                "failed to listen on `{}:{}`: {e}",
                server.host,
                server.port,
            );
        })?;

    log::info!(
        "serving GraphQL on `{}:{}{}`",
        server.host,
        server.port,
        server::GRAPHQL_PATH,
    );

    axum::serve(listener, app)
        .into_future()
        .map_err(|e| log::error!("webserver failed: {e}"))
        .await
}
