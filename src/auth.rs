use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    repository::RepositoryState,
};

/// Claims
///
/// Represents the payload structure carried inside a bearer token (JWT).
/// These claims are signed with the server's secret and validated upon every
/// authenticated request. Tokens are stateless: possession of a valid one is
/// the proof of a prior successful login, nothing is persisted server-side.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's login identifier. Used to re-resolve the
    /// user record on each authenticated request.
    pub sub: String,
    /// Expiration Time (exp): timestamp after which the token must not be accepted.
    pub exp: usize,
    /// Issued At (iat): timestamp when the token was issued.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request, produced by the
/// extractor below. Handlers take this as an argument to require a valid
/// session without re-implementing any token logic.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub login: String,
}

/// issue_token
///
/// Signs a fresh bearer token for the given login identifier. The expiry is
/// `iat` plus the configured TTL.
pub fn issue_token(login: &str, config: &AppConfig) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: login.to_string(),
        iat: now,
        exp: now + config.jwt_ttl_secs as usize,
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

/// hash_password
///
/// One-way salted hash of a plaintext credential, producing an argon2 PHC
/// string for storage. A fresh random salt is drawn per call.
pub fn hash_password(plain: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(ApiError::Hash)?;
    Ok(hash.to_string())
}

/// verify_password
///
/// Checks a plaintext credential against a stored PHC string. Any parse or
/// mismatch failure is simply "no": callers only ever branch on the bool.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a function argument
/// in any authenticated handler. This cleanly separates authentication
/// (middleware/extractor) from business logic (the handler).
///
/// The entire process involves:
/// 1. Dependency Resolution: Accessing Repository and AppConfig from the application state.
/// 2. Local Bypass: Allowing development-time access using the 'x-user-id' header.
/// 3. Token Validation: Standard Bearer token extraction and JWT decoding.
/// 4. Store Lookup: Resolving the token subject to a live user record.
///
/// Rejection: `ApiError::Unauthorized` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // Allows the extractor to pull the Repository State from the app state.
    RepositoryState: FromRef<S>,
    // Allows the extractor to pull the AppConfig (for the JWT secret and Env check).
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Local Development Bypass Check
        // In Env::Local only, a known user id in the 'x-user-id' header
        // authenticates the request. The id must still resolve against the
        // store so tests and local tooling exercise real records.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = id_str.parse::<i64>() {
                        if let Ok(Some(user)) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                login: user.login,
                            });
                        }
                    }
                }
            }
        }
        // In Production, or if the bypass did not resolve, execution falls
        // through to the standard JWT validation flow.

        // 3. Token Extraction
        // Retrieve the Authorization header and require the "Bearer " prefix.
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        // 4. JWT Decoding Setup
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        // Ensure expiration time validation is always active.
        validation.validate_exp = true;

        // 5. Decode and Validate the Token
        let token_data = match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                match e.kind() {
                    // Token expired: the most common failure for a valid-but-old token.
                    ErrorKind::ExpiredSignature => return Err(ApiError::Unauthorized),
                    // Catch all other failure types (bad signature, malformed token, etc.).
                    _ => return Err(ApiError::Unauthorized),
                }
            }
        };

        // 6. Store Lookup (Final Verification)
        // Resolve the token subject to a live user. This prevents access if
        // the user was removed after the token was issued.
        let user = repo
            .get_user_by_login(&token_data.claims.sub)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser {
            id: user.id,
            login: user.login,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip_verifies() {
        let hash = hash_password("correct horse battery").unwrap();
        // The stored form is a PHC string, never the plaintext.
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn distinct_salts_produce_distinct_hashes() {
        let a = hash_password("12345678").unwrap();
        let b = hash_password("12345678").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("12345678", &a));
        assert!(verify_password("12345678", &b));
    }

    #[test]
    fn verify_rejects_garbage_stored_value() {
        assert!(!verify_password("whatever", "not-a-phc-string"));
    }
}
