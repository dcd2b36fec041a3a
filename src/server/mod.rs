//! Server initialization and routing

use crate::api;
use crate::config::{Config, SessionBackend};
use crate::domain::{Permission, Role};
use crate::middleware::{access_guard_middleware, normalize_error_response, AccessGuard};
use crate::repository::{
    activity::ActivityRepositoryImpl, tenant::TenantRepositoryImpl, user::UserRepositoryImpl,
};
use crate::service::{
    AccessService, ImpersonationService, MembershipService, PlatformMetricsService,
};
use crate::session::{InMemorySessionStore, RedisSessionStore, SessionStore};
use crate::state::HasServices;
use anyhow::Result;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub sessions: Arc<dyn SessionStore>,
    pub access_service: Arc<AccessService<UserRepositoryImpl, TenantRepositoryImpl>>,
    pub impersonation_service: Arc<ImpersonationService<TenantRepositoryImpl>>,
    pub membership_service: Arc<MembershipService<UserRepositoryImpl, TenantRepositoryImpl>>,
    pub platform_metrics_service: Arc<
        PlatformMetricsService<UserRepositoryImpl, TenantRepositoryImpl, ActivityRepositoryImpl>,
    >,
}

impl AppState {
    /// Wire repositories and services over an existing pool and session store
    pub fn new(config: Config, db_pool: MySqlPool, sessions: Arc<dyn SessionStore>) -> Self {
        let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
        let tenant_repo = Arc::new(TenantRepositoryImpl::new(db_pool.clone()));
        let activity_repo = Arc::new(ActivityRepositoryImpl::new(db_pool.clone()));

        let impersonation_service = Arc::new(ImpersonationService::new(
            sessions.clone(),
            tenant_repo.clone(),
            config.view_as.ttl(),
        ));
        let access_service = Arc::new(AccessService::new(
            user_repo.clone(),
            impersonation_service.clone(),
        ));
        let membership_service = Arc::new(MembershipService::new(
            user_repo.clone(),
            tenant_repo.clone(),
        ));
        let platform_metrics_service = Arc::new(PlatformMetricsService::new(
            user_repo,
            tenant_repo,
            activity_repo,
            config.aggregator.clone(),
        ));

        Self {
            config: Arc::new(config),
            db_pool,
            sessions,
            access_service,
            impersonation_service,
            membership_service,
            platform_metrics_service,
        }
    }
}

impl HasServices for AppState {
    type UserRepo = UserRepositoryImpl;
    type TenantRepo = TenantRepositoryImpl;
    type ActivityRepo = ActivityRepositoryImpl;

    fn config(&self) -> &Config {
        &self.config
    }

    fn access_service(&self) -> &AccessService<Self::UserRepo, Self::TenantRepo> {
        &self.access_service
    }

    fn impersonation_service(&self) -> &ImpersonationService<Self::TenantRepo> {
        &self.impersonation_service
    }

    fn membership_service(&self) -> &MembershipService<Self::UserRepo, Self::TenantRepo> {
        &self.membership_service
    }

    fn platform_metrics_service(
        &self,
    ) -> &PlatformMetricsService<Self::UserRepo, Self::TenantRepo, Self::ActivityRepo> {
        &self.platform_metrics_service
    }

    async fn check_ready(&self) -> (bool, bool) {
        let db_ok = sqlx::query("SELECT 1").execute(&self.db_pool).await.is_ok();
        let sessions_ok = self.sessions.ping().await.is_ok();
        (db_ok, sessions_ok)
    }
}

/// Run the HTTP server
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    info!("Connected to database");

    let sessions: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Redis => {
            let store = RedisSessionStore::new(&config.session.redis, config.session.ttl()).await?;
            info!("Using Redis session store");
            Arc::new(store)
        }
        SessionBackend::Memory => {
            let store = Arc::new(InMemorySessionStore::new(config.session.ttl()));
            spawn_session_sweeper(store.clone());
            info!("Using in-memory session store");
            store
        }
    };

    let addr = config.http_addr();
    let state = AppState::new(config, db_pool, sessions);
    let app = build_router(state, prometheus_handle);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

fn spawn_session_sweeper(store: Arc<InMemorySessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = store.purge_expired().await;
            if purged > 0 {
                debug!(purged, "Expired sessions purged");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Build the HTTP router.
///
/// Each route group sits behind one access guard:
/// - view-as control: authenticated only, so a caller viewing as a low role
///   can always return to their real identity
/// - platform routes: `requireRole(SUPER_ADMIN)`
/// - member listing: `requirePermission(view_members)`
/// - member administration: `requireRole(ORG_ADMIN)`
pub fn build_router<S: HasServices>(state: S, prometheus_handle: Option<PrometheusHandle>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let view_as = Router::new()
        .route(
            "/api/v1/view-as",
            get(api::view_as::current)
                .post(api::view_as::grant::<S>)
                .delete(api::view_as::clear::<S>),
        )
        .route_layer(from_fn_with_state(
            AccessGuard::authenticated(state.clone()),
            access_guard_middleware::<S>,
        ));

    let platform = Router::new()
        .route(
            "/api/v1/platform/metrics",
            get(api::metrics::platform_metrics::<S>),
        )
        .route(
            "/api/v1/tenants/{id}/status",
            patch(api::membership::set_tenant_status::<S>),
        )
        .route_layer(from_fn_with_state(
            AccessGuard::require_role(state.clone(), Role::TOP),
            access_guard_middleware::<S>,
        ));

    let members = Router::new()
        .route("/api/v1/members", get(api::membership::list::<S>))
        .route_layer(from_fn_with_state(
            AccessGuard::require_permission(state.clone(), Permission::ViewMembers),
            access_guard_middleware::<S>,
        ));

    let member_admin = Router::new()
        .route(
            "/api/v1/users/{id}/role",
            patch(api::membership::change_role::<S>),
        )
        .route(
            "/api/v1/users/{id}/status",
            patch(api::membership::set_user_status::<S>),
        )
        .route(
            "/api/v1/users/{id}/transfer",
            post(api::membership::transfer::<S>),
        )
        .route_layer(from_fn_with_state(
            AccessGuard::require_role(state.clone(), Role::OrgAdmin),
            access_guard_middleware::<S>,
        ));

    let prometheus = Router::new()
        .route("/metrics", get(api::metrics::metrics_handler))
        .with_state(Arc::new(prometheus_handle));

    Router::new()
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        .merge(view_as)
        .merge(platform)
        .merge(members)
        .merge(member_admin)
        .with_state(state)
        .merge(prometheus)
        .layer(from_fn(normalize_error_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
