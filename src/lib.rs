//! Support data lifecycle and governance.
//!
//! Enforces retention and archival, runs irreversible bulk purges, schedules
//! backups, and gates audit-trail recording for a support-ticketing data
//! store. Destructive and exporting operations are admin-only.

pub mod auth;
pub mod backup;
pub mod config;
pub mod db;
pub mod jobs;
pub mod models;
pub mod observability;
pub mod purge;
pub mod retention;
pub mod routes;
pub mod services;
pub mod settings;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{config::StewardConfig, db::DbPool, services::Services};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StewardConfig>,
    pub db: Option<Arc<DbPool>>,
    pub services: Option<Services>,
}

impl AppState {
    /// Connect to the configured database (running migrations if enabled)
    /// and build the services over it.
    pub async fn new(config: StewardConfig) -> Result<Self, db::DbError> {
        if config.database.is_none() {
            tracing::warn!("No database configured, admin routes will be unavailable");
            return Ok(Self {
                config: Arc::new(config),
                db: None,
                services: None,
            });
        }

        let pool = DbPool::from_config(&config.database).await?;
        if config.database.run_migrations() {
            pool.run_migrations().await?;
        }
        Ok(Self::with_db(config, Arc::new(pool)))
    }

    /// Build state over an existing pool.
    pub fn with_db(config: StewardConfig, db: Arc<DbPool>) -> Self {
        let services = Services::new(Arc::clone(&db), &config.auth);
        Self {
            config: Arc::new(config),
            db: Some(db),
            services: Some(services),
        }
    }
}

pub fn build_app(config: &StewardConfig, state: AppState) -> Router {
    let mut app = Router::new().route("/health", get(routes::health::health_check));

    if config.observability.metrics.enabled {
        app = app.route("/metrics", get(routes::health::metrics));
    }

    // Only mount admin routes if a database is configured
    if !config.database.is_none() {
        app = app.nest("/admin", routes::admin::get_admin_routes(&config.server));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
