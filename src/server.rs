use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::entitlement::{Gate, Plan};
use crate::handlers::{elevated, protected, public};
use crate::middleware::{admin_auth_middleware, customer_auth_middleware, entitlement_gate};
use crate::state::AppState;

/// Full HTTP application over `state`.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/admin/login", post(public::admin_login))
        .route("/auth/logout", post(public::logout))
        // Customer dashboard
        .merge(customer_routes(&state))
        // Admin panel
        .merge(admin_routes(&state))
        .layer(cors_layer(&state.config.security));

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

/// Serve the application until the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, app(state)).await
}

// Authentication wraps the gates: route_layer runs the last-added layer first.
fn customer_routes(state: &AppState) -> Router<AppState> {
    let active = Router::new()
        .route("/api/dashboard/stats", get(protected::dashboard_stats))
        .route(
            "/api/subaccounts",
            get(protected::subaccounts_get).post(protected::subaccounts_post),
        );

    let pro = Router::new().route("/api/analytics", get(protected::analytics_get));
    let trial = Router::new().route("/api/onboarding/trial", get(protected::trial_onboarding_get));
    let paid = Router::new().route("/api/billing/subscription", get(protected::billing_subscription_get));

    Router::new()
        .route("/api/entitlement", get(protected::entitlement_get))
        .merge(gated(state, Gate::Active, active))
        // Tier checks alone ignore expiry, so analytics also needs a live plan.
        .merge(gated(state, Gate::Active, gated(state, Gate::MinimumPlan(Plan::Pro), pro)))
        .merge(gated(state, Gate::ActiveTrial, trial))
        .merge(gated(state, Gate::PaidSubscription, paid))
        .route_layer(middleware::from_fn_with_state(state.clone(), customer_auth_middleware))
}

fn gated(state: &AppState, gate: Gate, routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state((state.clone(), gate), entitlement_gate))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    use axum::routing::patch;

    Router::new()
        .route("/api/admin/customers", get(elevated::customer_list))
        .route("/api/admin/customers/:id", get(elevated::customer_show))
        .route("/api/admin/customers/:id/plan", patch(elevated::customer_plan_update))
        .route(
            "/api/admin/customers/:id/subaccounts/increase",
            post(elevated::customer_quota_increase),
        )
        .route("/api/admin/stats", get(elevated::admin_stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
