use bookgate_access::{
    AuthorizationPolicy, IdentityRecordStore, MemoryIdentityStore, MemorySessionStore,
    ProviderClient, SessionStore,
};
use bookgate_server::{
    app,
    auth::{
        AppState, OAuthProviderClient,
        db::{PgIdentityStore, PgSessionStore},
    },
    config::ServerConfig,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let policy = match &config.authorization {
        Some(rules) => AuthorizationPolicy::from_config(rules),
        None => AuthorizationPolicy::catalog_default(),
    }
    .expect("invalid authorization rules");
    for rule in policy.rules() {
        tracing::debug!(
            pattern = %rule.pattern(),
            requirement = ?rule.requirement(),
            "Authorization rule"
        );
    }
    tracing::info!(rules = policy.rules().len(), "Authorization policy loaded");

    let provider: Arc<dyn ProviderClient> = Arc::new(
        OAuthProviderClient::new(&config.provider).expect("invalid provider configuration"),
    );

    let (identities, sessions): (Arc<dyn IdentityRecordStore>, Arc<dyn SessionStore>) =
        match &config.database_url {
            Some(database_url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(database_url)
                    .await
                    .expect("failed to connect to database");

                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations")
                    .run(&db_pool)
                    .await
                    .expect("failed to run migrations");

                (
                    Arc::new(PgIdentityStore::new(db_pool.clone())),
                    Arc::new(PgSessionStore::new(db_pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set, identities and sessions are kept in memory");
                (
                    Arc::new(MemoryIdentityStore::new()),
                    Arc::new(MemorySessionStore::new()),
                )
            }
        };

    // Cleanup expired sessions on startup
    match sessions.delete_expired().await {
        Ok(count) if count > 0 => {
            tracing::info!(
                deleted_sessions = count,
                "Cleaned up expired sessions on startup"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Failed to cleanup expired sessions on startup");
        }
    }

    // Spawn periodic session cleanup task
    let cleanup_sessions = sessions.clone();
    let cleanup_interval_secs = config.session.cleanup_interval_seconds;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            match cleanup_sessions.delete_expired().await {
                Ok(count) if count > 0 => {
                    tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to cleanup expired sessions");
                }
            }
        }
    });

    let app_state = Arc::new(AppState::new(
        provider,
        identities,
        sessions,
        policy,
        config.session.clone(),
        config.provider.revoke_timeout(),
    ));

    let app = app::router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
