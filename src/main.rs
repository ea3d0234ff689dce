//! Canvass Backend
//!
//! REST backend for campaign-based field contact collection with SQLite persistence.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod export;
mod models;
mod scheduler;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use models::Role;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Canvass Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.scheduler_key.is_none() {
        tracing::warn!(
            "No scheduler key configured (CANVASS_SCHEDULER_KEY). Finish-campaigns requires an admin session"
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    bootstrap_admin(&repo, &config).await?;

    scheduler::spawn_finish_task(repo.clone(), config.finish_interval_secs);

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the configured administrator account when it does not exist yet.
pub async fn bootstrap_admin(repo: &Repository, config: &Config) -> Result<(), errors::AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    let email = api::normalize_email(email);
    if repo.find_credentials(&email).await?.is_some() {
        return Ok(());
    }

    let base = email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or("admin");
    let mut username = base.to_string();
    let mut suffix = 1;
    while !repo.username_available(&username).await? {
        suffix += 1;
        username = format!("{}{}", base, suffix);
    }
    if suffix > 1 {
        tracing::warn!(
            "Username {:?} is taken; bootstrap administrator will use {:?}",
            base,
            username
        );
    }

    let password_hash = api::hash_blocking(password.clone()).await?;
    let user = repo
        .create_user(&email, &username, &password_hash, Role::Admin)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Created bootstrap administrator");
    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes that resolve their caller themselves, or need none
    let public_routes = Router::new()
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login))
        .route("/settings", get(api::get_settings))
        .route(
            "/functions/finish-campaigns",
            post(api::finish_expired_campaigns),
        );

    let protected_routes = Router::new()
        // Session
        .route("/auth/logout", post(api::logout))
        .route("/auth/me", get(api::get_me))
        .route("/auth/me", put(api::update_me))
        .route("/auth/password", put(api::change_password))
        // Campaigns
        .route("/campaigns", get(api::list_campaigns))
        .route("/campaigns", post(api::create_campaign))
        .route("/campaigns/{id}", get(api::get_campaign))
        .route("/campaigns/{id}", put(api::update_campaign))
        .route("/campaigns/{id}", delete(api::delete_campaign))
        .route("/campaigns/{id}/finish", post(api::finish_campaign))
        .route("/campaigns/{id}/reopen", post(api::reopen_campaign))
        .route("/campaigns/{id}/join", post(api::join_campaign))
        .route("/campaigns/{id}/leave", post(api::leave_campaign))
        // Participation
        .route("/participation/active", get(api::get_active_campaign))
        .route("/participation/active", put(api::switch_active_campaign))
        .route("/participation/active", delete(api::leave_active_campaign))
        // Contacts
        .route("/contacts", get(api::list_contacts))
        .route("/contacts", post(api::create_contact))
        .route("/contacts/{id}", put(api::update_contact))
        .route("/contacts/{id}", delete(api::delete_contact))
        .route("/neighborhoods", get(api::list_neighborhoods))
        // Reports
        .route("/reports/dashboard", get(api::get_dashboard))
        .route("/reports/top-collectors", get(api::get_top_collectors))
        .route("/reports/recent-campaigns", get(api::get_recent_campaigns))
        // Users
        .route("/users", get(api::list_users))
        .route("/users/{id}/role", put(api::update_user_role))
        .route("/users/{id}", delete(api::delete_user))
        // Export
        .route("/export/contacts", get(api::export_contacts_xlsx))
        .route("/export/campaigns/{id}", get(api::export_campaign_xlsx))
        .route("/export/all", get(api::export_all_xlsx))
        // Settings
        .route("/settings", put(api::update_settings))
        // Resolve bearer sessions
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_layer,
        ));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
