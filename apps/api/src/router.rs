use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use muster_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState, allowed_origin: &str) -> Result<Router, AppError> {
    let cors = CorsLayer::new()
        .allow_origin(
            allowed_origin
                .parse::<HeaderValue>()
                .map_err(|error| AppError::Validation(format!("invalid ALLOWED_ORIGIN: {error}")))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::authorization::me_handler))
        .route(
            "/api/authorization/check",
            post(handlers::authorization::check_permission_handler),
        )
        .route(
            "/api/admins",
            get(handlers::admins::list_admins_handler).post(handlers::admins::create_admin_handler),
        )
        .route("/api/admins/{user_id}", get(handlers::admins::get_admin_handler))
        .route(
            "/api/admins/{user_id}/permissions",
            get(handlers::admins::admin_permissions_handler),
        )
        .route(
            "/api/admins/{user_id}/roles",
            put(handlers::admins::update_admin_roles_handler),
        )
        .route(
            "/api/admins/{user_id}/deactivate",
            post(handlers::admins::deactivate_admin_handler),
        )
        .route(
            "/api/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}",
            get(handlers::roles::get_role_handler)
                .put(handlers::roles::update_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/permissions",
            get(handlers::permissions::list_permissions_handler),
        )
        .route(
            "/api/permissions/{name}",
            put(handlers::permissions::update_permission_handler),
        )
        .route("/api/audit", get(handlers::audit::list_audit_log_handler))
        .layer(from_fn_with_state(app_state.clone(), middleware::require_auth));

    Ok(Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state))
}
