use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::ApiError;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Represents a registered author stored in the `users` table.
/// The `password` field holds the argon2 PHC string at rest. It is accepted on
/// input (deserialization) but never serialized back to a client: the secret
/// credential is write-only at the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct User {
    pub id: i64,
    // Display name.
    pub name: String,
    // Login identifier, unique and email-shaped.
    pub login: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    // Optional profile photo URL.
    pub photo: Option<String>,
}

/// Topic
///
/// A named category that posts reference. Must exist before any post can
/// attach to it (checked at write time, not enforced by the store).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Topic {
    pub id: i64,
    pub description: String,
}

/// Post
///
/// A titled, bodied content record owned by a user and categorized by a topic.
/// `created_at` is assigned by the store on insert and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    // Reference to the categorizing topic. Checked against the store before
    // every create/update.
    pub topic_id: i64,
    // Reference to the owning user. Set on creation, never changed by updates.
    pub user_id: i64,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /usuarios/cadastrar).
/// The password arrives in plaintext over the transport and is hashed before
/// it ever reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct RegisterUserRequest {
    pub name: String,
    pub login: String,
    pub password: String,
    pub photo: Option<String>,
}

/// UpdateUserRequest
///
/// Input payload for profile updates (PUT /usuarios/atualizar). Must carry the
/// id of an existing user. The password is re-hashed on every update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateUserRequest {
    pub id: i64,
    pub name: String,
    pub login: String,
    pub password: String,
    pub photo: Option<String>,
}

/// LoginRequest
///
/// Credentials presented to POST /usuarios/logar.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// LoginResponse
///
/// Output of a successful authentication: the user's public fields plus a
/// freshly signed bearer token. The stored credential is never echoed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LoginResponse {
    pub id: i64,
    pub name: String,
    pub login: String,
    pub photo: Option<String>,
    pub token: String,
}

/// CreatePostRequest
///
/// Input payload for submitting a new post (POST /postagens). Any id supplied
/// by the client is ignored; the store assigns one.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreatePostRequest {
    pub title: String,
    pub text: String,
    pub topic_id: i64,
    pub user_id: i64,
}

/// UpdatePostRequest
///
/// Input payload for replacing an existing post's content (PUT /postagens).
/// The owner and creation timestamp of the stored post are preserved.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdatePostRequest {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub topic_id: i64,
}

/// CreateTopicRequest
///
/// Input payload for creating a topic (POST /temas).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateTopicRequest {
    pub description: String,
}

/// UpdateTopicRequest
///
/// Input payload for renaming a topic (PUT /temas).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateTopicRequest {
    pub id: i64,
    pub description: String,
}

// --- Input Validation ---

// Explicit validation functions invoked at the start of each mutating handler.
// Limits mirror the constraints the original schema carried.

fn validate_name(name: &str) -> Result<(), ApiError> {
    let len = name.trim().chars().count();
    if len < 2 || len > 100 {
        return Err(ApiError::BadRequest(
            "name must be between 2 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_login(login: &str) -> Result<(), ApiError> {
    if !is_email_shaped(login) {
        return Err(ApiError::BadRequest(
            "login must be a valid email address".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    let len = title.trim().chars().count();
    if len < 5 || len > 100 {
        return Err(ApiError::BadRequest(
            "title must be between 5 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_text(text: &str) -> Result<(), ApiError> {
    let len = text.trim().chars().count();
    if len < 10 || len > 1000 {
        return Err(ApiError::BadRequest(
            "text must be between 10 and 1000 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ApiError> {
    let len = description.trim().chars().count();
    if len == 0 || len > 255 {
        return Err(ApiError::BadRequest(
            "description must be between 1 and 255 characters".to_string(),
        ));
    }
    Ok(())
}

// Shape check only: one '@', non-empty local part, dotted domain. Anything
// stricter belongs to an email round-trip, which this system does not do.
fn is_email_shaped(login: &str) -> bool {
    match login.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)?;
        validate_login(&self.login)?;
        validate_password(&self.password)
    }
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)?;
        validate_login(&self.login)?;
        validate_password(&self.password)
    }
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_title(&self.title)?;
        validate_text(&self.text)
    }
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_title(&self.title)?;
        validate_text(&self.text)
    }
}

impl CreateTopicRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_description(&self.description)
    }
}

impl UpdateTopicRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_description(&self.description)
    }
}
