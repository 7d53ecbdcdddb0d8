// src/admin/routes.rs

use axum::{
    routing::{delete, get},
    Router,
};

use super::handlers::{dashboard, invitations, settings, users};

pub fn admin_routes() -> Router {
    Router::new()
        .route("/api/admin/dashboard", get(dashboard::dashboard_stats))
        .route("/api/admin/users", get(users::list_users))
        .route("/api/admin/users/:id", delete(users::delete_user))
        .route(
            "/api/admin/invitations",
            get(invitations::list_invitations).post(invitations::create_invitation),
        )
        .route(
            "/api/admin/invitations/:id",
            delete(invitations::revoke_invitation),
        )
        .route(
            "/api/admin/settings",
            get(settings::get_system_settings).put(settings::update_system_settings),
        )
        .route(
            "/api/admin/settings/:key",
            delete(settings::delete_system_setting),
        )
}
