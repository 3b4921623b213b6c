use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible only with a valid bearer token: the user
/// management surface.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware being
/// present on the router layer above this module. This guarantees that all handlers
/// receive a validated `AuthUser`, so none of them re-implement token logic.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // PUT /usuarios/atualizar
        // Updates a user's profile. The new login must stay unique and the
        // supplied password is re-hashed before storage.
        .route("/usuarios/atualizar", put(handlers::update_user))
        // GET /usuarios/all
        // Lists every registered user (public fields only).
        .route("/usuarios/all", get(handlers::get_users))
        // GET /usuarios/{id}
        // Retrieves a single user. The static /usuarios/all segment wins the
        // match over this parameter.
        .route("/usuarios/{id}", get(handlers::get_user_by_id))
}
