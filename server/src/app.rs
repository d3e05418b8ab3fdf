//! Application wiring and lifecycle.
//!
//! [`Application::build`] connects every resource; [`Application::run`]
//! serves HTTP until a shutdown signal and then:
//!
//! 1. Stops accepting new connections
//! 2. Broadcasts shutdown to the expiry sweeper
//! 3. Waits up to the configured timeout for in-flight work
//!
//! # Example
//!
//! ```rust,ignore
//! let app = Application::build(Config::from_env()).await?;
//! app.run().await?;
//! ```

use crate::config::Config;
use anyhow::Context;
use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use roombnb_core::environment::SystemClock;
use roombnb_core::notification::NotificationSink;
use roombnb_postgres::PostgresStore;
use roombnb_runtime::metrics::MetricsServer;
use roombnb_runtime::notifications::{ConsoleNotificationSink, SmtpNotificationSink};
use roombnb_runtime::{ExpirySweeper, Notifier};
use roombnb_web::{AppState, build_router};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

/// Fully wired service, ready to run.
pub struct Application {
    listener: TcpListener,
    router: Router,
    sweeper: Option<ExpirySweeper>,
    shutdown_tx: broadcast::Sender<()>,
    config: Arc<Config>,
    _metrics: MetricsServer,
}

impl Application {
    /// Connects to the database, applies migrations, selects the
    /// notification sink, starts the metrics exporter and binds the listener.
    ///
    /// # Errors
    ///
    /// Returns error if the database is unreachable, a migration fails, the
    /// SMTP transport or CORS origin is invalid, or an address cannot be bound.
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let mut metrics = MetricsServer::new(
            config
                .metrics_address()
                .parse()
                .context("Invalid metrics address")?,
        );
        metrics.start()?;

        tracing::info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.postgres.max_connections)
            .min_connections(config.postgres.min_connections)
            .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
            .idle_timeout(Some(Duration::from_secs(config.postgres.idle_timeout)))
            .connect(&config.postgres.url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        let store = Arc::new(PostgresStore::new(pool));
        store.migrate().await?;
        tracing::info!("Database ready");

        let notifier = Notifier::new(notification_sink(&config)?);
        let state = AppState::new(store.clone(), store, notifier, Arc::new(SystemClock))
            .with_maintenance_token(config.maintenance.token.clone());
        if state.maintenance_token.is_none() {
            tracing::warn!("MAINTENANCE_TOKEN not set, manual sweep endpoint disabled");
        }

        let sweeper = config.sweep.enabled.then(|| {
            ExpirySweeper::new(
                state.engine.clone(),
                Duration::from_secs(config.sweep.interval_secs),
            )
        });

        let router = build_router(state).layer(cors_layer(&config)?);

        let address = config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {address}"))?;

        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            listener,
            router,
            sweeper,
            shutdown_tx,
            config: Arc::new(config),
            _metrics: metrics,
        })
    }

    /// Serves until Ctrl+C or SIGTERM, then shuts down gracefully.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP server fails.
    pub async fn run(self) -> anyhow::Result<()> {
        let sweeper = self.sweeper.map(|sweeper| {
            let shutdown = self.shutdown_tx.subscribe();
            tokio::spawn(sweeper.run(shutdown))
        });
        if sweeper.is_none() {
            tracing::info!("Expiry sweeper disabled");
        }

        let mut draining = self.shutdown_tx.subscribe();
        let shutdown_tx = self.shutdown_tx.clone();
        let listener = self.listener;
        let router = self.router;
        tracing::info!(address = %self.config.bind_address(), "HTTP server listening for requests");
        let mut server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_signal().await;
                    let _ = shutdown_tx.send(());
                })
                .await
        });

        let timeout = self.config.shutdown_timeout();
        tokio::select! {
            result = &mut server => {
                result.context("HTTP server task panicked")??;
            }
            _ = draining.recv() => {
                tracing::info!(timeout_secs = timeout.as_secs(), "Draining in-flight requests...");
                if let Ok(result) = tokio::time::timeout(timeout, &mut server).await {
                    result.context("HTTP server task panicked")??;
                } else {
                    tracing::warn!("HTTP drain timed out, dropping remaining connections");
                    server.abort();
                }
            }
        }

        let _ = self.shutdown_tx.send(());
        if let Some(handle) = sweeper {
            await_task("expiry sweeper", handle, timeout).await;
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }
}

fn notification_sink(config: &Config) -> anyhow::Result<Arc<dyn NotificationSink>> {
    if let Some(settings) = config.email.smtp_settings() {
        tracing::info!(host = %settings.host, port = settings.port, "Sending notifications over SMTP");
        Ok(Arc::new(SmtpNotificationSink::new(&settings)?))
    } else {
        tracing::warn!("SMTP credentials not configured, notifications will only be logged");
        Ok(Arc::new(ConsoleNotificationSink))
    }
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-correlation-id"),
            HeaderName::from_static("x-maintenance-token"),
        ]);

    Ok(match &config.server.cors_allowed_origin {
        Some(origin) => layer
            .allow_origin(
                HeaderValue::from_str(origin)
                    .with_context(|| format!("Invalid CORS origin {origin}"))?,
            )
            .allow_credentials(true),
        None => layer.allow_origin(Any),
    })
}

async fn await_task(name: &str, handle: JoinHandle<()>, timeout: Duration) {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(())) => tracing::info!(task = name, "Task stopped gracefully"),
        Ok(Err(e)) => tracing::warn!(task = name, error = %e, "Task failed"),
        Err(_) => tracing::warn!(task = name, "Task shutdown timed out"),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        }
    }
}
