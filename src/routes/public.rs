use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in): the whole post and topic CRUD surface, plus the
/// two identity gateways (registration and login).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // --- Posts ---
        // GET /postagens lists everything; POST creates (201) after the
        // topic-existence check; PUT replaces an existing post's content.
        .route(
            "/postagens",
            get(handlers::get_posts)
                .post(handlers::create_post)
                .put(handlers::update_post),
        )
        // GET /postagens/{id} → 200/404, DELETE → 204/404.
        .route(
            "/postagens/{id}",
            get(handlers::get_post_by_id).delete(handlers::delete_post),
        )
        // GET /postagens/titulo/{titulo}
        // Case-insensitive substring search over titles. Empty matches are a 200.
        .route("/postagens/titulo/{titulo}", get(handlers::get_posts_by_title))
        // --- Topics ---
        .route(
            "/temas",
            get(handlers::get_topics)
                .post(handlers::create_topic)
                .put(handlers::update_topic),
        )
        .route(
            "/temas/{id}",
            get(handlers::get_topic_by_id).delete(handlers::delete_topic),
        )
        .route(
            "/temas/descricao/{descricao}",
            get(handlers::get_topics_by_description),
        )
        // --- Identity Gateways ---
        // POST /usuarios/cadastrar
        // New user creation. Duplicate logins are rejected before any write.
        .route("/usuarios/cadastrar", post(handlers::register_user))
        // POST /usuarios/logar
        // Credential check + bearer token issuance.
        .route("/usuarios/logar", post(handlers::login_user))
}
