/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.

/// Routes accessible to all users: the post and topic surfaces, registration,
/// and login.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware: user management.
/// Requires a valid bearer token.
pub mod authenticated;
