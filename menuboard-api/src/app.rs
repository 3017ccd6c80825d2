/// Application state and router
///
/// Route groups:
///
/// - `/health`: liveness and database check
/// - `/v1/auth`: registration, login, token refresh
/// - `/v1/public`: customer menu, orders and waiter calls (by tenant slug)
/// - `/v1/billing/activate`: signed payment provider webhook
/// - `/v1/admin`: restaurant back office (JWT)
/// - `/v1/super`: platform administration (JWT, super admin role)

use crate::{
    config::Config,
    middleware::{auth, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post, put},
    Router,
};
use menuboard_shared::access::AccessGate;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub gate: AccessGate,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            gate: AccessGate::new(db.clone()),
            db,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route(
            "/me",
            get(routes::auth::me).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth::admin_auth,
            )),
        );

    let public_routes = Router::new()
        .route("/landing", get(routes::public::landing))
        .route("/:slug/menu", get(routes::public::menu))
        .route("/:slug/settings", get(routes::public::settings))
        .route("/:slug/orders", post(routes::public::place_order))
        .route("/:slug/orders/:id", get(routes::public::order_status))
        .route("/:slug/waiter-calls", post(routes::public::call_waiter));

    let admin_routes = admin_router().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        auth::admin_auth,
    ));

    let super_routes = super_router().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        auth::super_admin_auth,
    ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/public", public_routes)
        .route("/billing/activate", post(routes::billing::activate))
        .nest("/admin", admin_routes)
        .nest("/super", super_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn admin_router() -> Router<AppState> {
    use routes::admin::{billing, categories, orders, products, settings, users, waiter_calls};

    Router::new()
        // Menu catalog
        .route("/categories", get(categories::list).post(categories::create))
        .route("/categories/reorder", post(categories::reorder))
        .route(
            "/categories/:id",
            get(categories::get).patch(categories::update).delete(categories::delete),
        )
        .route("/products", get(products::list).post(products::create))
        .route("/products/reorder", post(products::reorder))
        .route(
            "/products/:id",
            get(products::get).patch(products::update).delete(products::delete),
        )
        .route("/products/:id/availability", patch(products::set_availability))
        .route(
            "/products/:id/variants",
            get(products::list_variants).post(products::create_variant),
        )
        .route(
            "/variants/:id",
            patch(products::update_variant).delete(products::delete_variant),
        )
        .route(
            "/products/:id/customization-groups",
            get(products::list_groups).post(products::create_group),
        )
        .route(
            "/customization-groups/:id",
            patch(products::update_group).delete(products::delete_group),
        )
        .route("/customization-groups/:id/options", post(products::create_option))
        .route(
            "/customization-options/:id",
            patch(products::update_option).delete(products::delete_option),
        )
        // Service
        .route("/orders", get(orders::feed))
        .route("/orders/stats", get(orders::stats))
        .route("/orders/:id", get(orders::get).delete(orders::delete))
        .route("/orders/:id/status", patch(orders::update_status))
        .route("/waiter-calls", get(waiter_calls::feed))
        .route("/waiter-calls/:id/status", patch(waiter_calls::update_status))
        // Appearance
        .route("/settings", get(settings::get).put(settings::update))
        .route("/qr-codes", get(settings::qr_codes))
        // Account
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", patch(users::update).delete(users::delete))
        .route("/billing", get(billing::overview))
        .route("/billing/checkout", post(billing::checkout))
}

fn super_router() -> Router<AppState> {
    use routes::super_admin;

    Router::new()
        .route("/tenants", get(super_admin::list_tenants))
        .route(
            "/tenants/:id",
            get(super_admin::get_tenant)
                .patch(super_admin::update_tenant)
                .delete(super_admin::delete_tenant),
        )
        .route("/tenants/:id/extend-trial", post(super_admin::extend_trial))
        .route("/tenants/:id/premium", post(super_admin::grant_premium))
        .route("/transactions", get(super_admin::list_transactions))
        .route("/stats", get(super_admin::stats))
        .route(
            "/landing/:section",
            put(super_admin::put_landing_section).delete(super_admin::delete_landing_section),
        )
}
