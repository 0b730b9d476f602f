//! TaskHub - Task Management REST API
//! Mission: Small task-management service with a bearer-token session core

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, time::interval};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskhub_backend::{
    api::{self, AppState},
    auth::{
        api as auth_api, auth_middleware, AuthState, JwtHandler, RevocationRegistry,
        SessionAuthenticator, UserStore,
    },
    middleware::request_logging,
    models::Config,
    tasks::TaskStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        db = %config.database_path,
        port = config.port,
        ttl_minutes = config.token_ttl_minutes,
        "🚀 Starting TaskHub backend"
    );

    let user_store = Arc::new(
        UserStore::new(&config.database_path).context("Failed to initialize user store")?,
    );
    let task_store = Arc::new(
        TaskStore::new(&config.database_path).context("Failed to initialize task store")?,
    );

    let jwt_handler = Arc::new(JwtHandler::new(
        config.jwt_secret.clone(),
        config.token_ttl_minutes,
    ));
    let revocations = Arc::new(RevocationRegistry::new());
    let sessions = Arc::new(SessionAuthenticator::new(
        jwt_handler.clone(),
        revocations.clone(),
        user_store.clone(),
    ));

    // Revoked tokens pile up for the process lifetime otherwise; sweep the
    // ones whose own expiry has already passed.
    tokio::spawn(revocation_sweep_polling(
        revocations.clone(),
        config.revocation_sweep_secs,
    ));

    let auth_state = AuthState::new(user_store.clone(), jwt_handler, revocations);
    let app_state = AppState::new(user_store, task_store);

    // Public routes: health, registration, login, logout
    let auth_router = Router::new()
        .route("/api/users", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/logout", post(auth_api::logout))
        .with_state(auth_state);

    // Protected routes sit behind the session gate
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth_api::me))
        .route(
            "/api/users/:id",
            get(api::users::get_user)
                .put(api::users::update_user)
                .delete(api::users::delete_user),
        )
        .route(
            "/api/tasks",
            get(api::tasks::list_tasks).post(api::tasks::create_task),
        )
        .route(
            "/api/tasks/:id",
            get(api::tasks::get_task)
                .put(api::tasks::update_task)
                .delete(api::tasks::delete_task),
        )
        .route_layer(middleware::from_fn_with_state(sessions, auth_middleware))
        .with_state(app_state);

    let public_routes = Router::new().route("/health", get(health_check));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(auth_router)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Periodically drop revocation entries whose tokens have expired anyway.
async fn revocation_sweep_polling(revocations: Arc<RevocationRegistry>, every_secs: u64) {
    let mut ticker = interval(Duration::from_secs(every_secs.max(1)));
    loop {
        ticker.tick().await;
        revocations.purge_expired(Utc::now().timestamp());
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhub_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
