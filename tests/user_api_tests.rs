use blog_pessoal::{
    AppConfig, AppState, MemoryRepository, create_router, models::LoginResponse, models::User,
    repository::RepositoryState,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

/// Spawns the full router over the in-memory repository on an ephemeral port.
/// Each test gets an isolated store, so there is no cross-test state.
async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new()) as RepositoryState;
    let config = AppConfig::default();

    let state = AppState { repo, config };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

fn register_body(name: &str, login: &str, password: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "login": login,
        "password": password,
        "photo": null
    })
}

async fn register(app: &TestApp, client: &reqwest::Client, login: &str) -> User {
    let response = client
        .post(format!("{}/usuarios/cadastrar", app.address))
        .json(&register_body("Test User", login, "12345678"))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

async fn login(app: &TestApp, client: &reqwest::Client, login: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/usuarios/logar", app.address))
        .json(&serde_json::json!({ "login": login, "password": password }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(response.status(), 200);
    let body: LoginResponse = response.json().await.unwrap();
    body.token
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_register_user_success_and_password_not_echoed() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/usuarios/cadastrar", app.address))
        .json(&register_body(
            "Paulo Antunes",
            "paulo_antunes@email.com.br",
            "12345678",
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["login"], "paulo_antunes@email.com.br");
    // The credential is write-only: no password field in any response body.
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_login_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register(&app, &client, "maria_silva@email.com.br").await;

    let response = client
        .post(format!("{}/usuarios/cadastrar", app.address))
        .json(&register_body(
            "Maria da Silva",
            "maria_silva@email.com.br",
            "12345678",
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_register_rejects_invalid_payloads() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Short password.
    let response = client
        .post(format!("{}/usuarios/cadastrar", app.address))
        .json(&register_body("Ana", "ana@email.com", "1234567"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Non-email login.
    let response = client
        .post(format!("{}/usuarios/cadastrar", app.address))
        .json(&register_body("Ana", "not-an-email", "12345678"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_login_success_returns_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register(&app, &client, "anamaria@email.com.br").await;

    let response = client
        .post(format!("{}/usuarios/logar", app.address))
        .json(&serde_json::json!({ "login": "anamaria@email.com.br", "password": "12345678" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: LoginResponse = response.json().await.unwrap();
    assert_eq!(body.login, "anamaria@email.com.br");
    assert!(!body.token.is_empty());
}

#[tokio::test]
async fn test_login_failures_are_unauthorized() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register(&app, &client, "carlos_moura@email.com.br").await;

    // Wrong password.
    let response = client
        .post(format!("{}/usuarios/logar", app.address))
        .json(&serde_json::json!({ "login": "carlos_moura@email.com.br", "password": "wrongpass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Unknown login: same status, indistinguishable from the wrong-password case.
    let response = client
        .post(format!("{}/usuarios/logar", app.address))
        .json(&serde_json::json!({ "login": "nobody@email.com.br", "password": "12345678" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_list_users_requires_token_end_to_end() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    register(&app, &client, "ana_marques@email.com.br").await;

    // No token: rejected at the middleware layer.
    let response = client
        .get(format!("{}/usuarios/all", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Garbage token: also rejected.
    let response = client
        .get(format!("{}/usuarios/all", app.address))
        .header("Authorization", "Bearer not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Fresh token: the registrant appears in the listing.
    let token = login(&app, &client, "ana_marques@email.com.br", "12345678").await;
    let response = client
        .get(format!("{}/usuarios/all", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let users: Vec<User> = response.json().await.unwrap();
    assert!(users.iter().any(|u| u.login == "ana_marques@email.com.br"));
}

#[tokio::test]
async fn test_get_user_by_id() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let created = register(&app, &client, "fernandalima@email.com.br").await;
    let token = login(&app, &client, "fernandalima@email.com.br", "12345678").await;

    let response = client
        .get(format!("{}/usuarios/{}", app.address, created.id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let user: User = response.json().await.unwrap();
    assert_eq!(user.name, "Test User");
    assert_eq!(user.login, "fernandalima@email.com.br");

    // Unknown id under a valid token is a plain 404.
    let response = client
        .get(format!("{}/usuarios/99999", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_update_user() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let created = register(&app, &client, "ju_andrews@email.com.br").await;
    let token = login(&app, &client, "ju_andrews@email.com.br", "12345678").await;

    let response = client
        .put(format!("{}/usuarios/atualizar", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "id": created.id,
            "name": "Juliana Ramos",
            "login": "ju_ramos@email.com.br",
            "password": "12345678",
            "photo": null
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let updated: User = response.json().await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Juliana Ramos");
    assert_eq!(updated.login, "ju_ramos@email.com.br");

    // The new credentials authenticate.
    login(&app, &client, "ju_ramos@email.com.br", "12345678").await;
}

#[tokio::test]
async fn test_update_user_rejects_stolen_login_and_unknown_id() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let a = register(&app, &client, "a@email.com.br").await;
    register(&app, &client, "b@email.com.br").await;
    let token = login(&app, &client, "a@email.com.br", "12345678").await;

    // Taking another user's login is a duplicate-key rejection.
    let response = client
        .put(format!("{}/usuarios/atualizar", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "id": a.id,
            "name": "User A",
            "login": "b@email.com.br",
            "password": "12345678",
            "photo": null
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Updating an id that does not exist is a 404, payload validity aside.
    let response = client
        .put(format!("{}/usuarios/atualizar", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "id": 99999,
            "name": "Ghost",
            "login": "ghost@email.com.br",
            "password": "12345678",
            "photo": null
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}
