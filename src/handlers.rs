use crate::{
    AppState,
    auth::{self, AuthUser},
    error::ApiError,
    models::{
        CreatePostRequest, CreateTopicRequest, LoginRequest, LoginResponse, Post,
        RegisterUserRequest, Topic, UpdatePostRequest, UpdateTopicRequest, UpdateUserRequest, User,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

// --- Post Handlers ---

/// get_posts
///
/// [Public Route] Lists every post in natural storage order.
#[utoipa::path(
    get,
    path = "/postagens",
    responses((status = 200, description = "All posts", body = [Post]))
)]
pub async fn get_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.repo.get_posts().await?))
}

/// get_post_by_id
///
/// [Public Route] Retrieves a single post by id; 404 when absent.
#[utoipa::path(
    get,
    path = "/postagens/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    match state.repo.get_post(id).await? {
        Some(post) => Ok(Json(post)),
        None => Err(ApiError::NotFound),
    }
}

/// get_posts_by_title
///
/// [Public Route] Case-insensitive substring search over post titles.
/// An empty result is still a 200.
#[utoipa::path(
    get,
    path = "/postagens/titulo/{titulo}",
    params(("titulo" = String, Path, description = "Title search term")),
    responses((status = 200, description = "Matching posts", body = [Post]))
)]
pub async fn get_posts_by_title(
    State(state): State<AppState>,
    Path(titulo): Path<String>,
) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.repo.get_posts_by_title(&titulo).await?))
}

/// create_post
///
/// [Public Route] Submits a new post.
///
/// *Referential precondition*: the referenced topic must exist at the moment
/// of write. On failure the request is rejected as a 400 (client error, not
/// 404) and nothing is written.
#[utoipa::path(
    post,
    path = "/postagens",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Validation failure or missing topic")
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    payload.validate()?;

    if !state.repo.topic_exists(payload.topic_id).await? {
        return Err(ApiError::BadRequest("Topic does not exist".to_string()));
    }

    let post = state.repo.create_post(payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Public Route] Replaces the content of an existing post.
///
/// Ordering matters: an unknown post id is a 404 before the payload or the
/// topic reference is ever considered; a known post with a dangling topic
/// reference is a 400.
#[utoipa::path(
    put,
    path = "/postagens",
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 400, description = "Validation failure or missing topic"),
        (status = 404, description = "Unknown post id")
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    if !state.repo.post_exists(payload.id).await? {
        return Err(ApiError::NotFound);
    }

    payload.validate()?;

    if !state.repo.topic_exists(payload.topic_id).await? {
        return Err(ApiError::BadRequest("Topic does not exist".to_string()));
    }

    match state.repo.update_post(payload).await? {
        Some(post) => Ok(Json(post)),
        // The row vanished between the existence probe and the write.
        None => Err(ApiError::NotFound),
    }
}

/// delete_post
///
/// [Public Route] Deletes a post by id. The second delete of the same id is a 404.
#[utoipa::path(
    delete,
    path = "/postagens/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_post(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Topic Handlers ---

/// get_topics
///
/// [Public Route] Lists every topic.
#[utoipa::path(
    get,
    path = "/temas",
    responses((status = 200, description = "All topics", body = [Topic]))
)]
pub async fn get_topics(State(state): State<AppState>) -> Result<Json<Vec<Topic>>, ApiError> {
    Ok(Json(state.repo.get_topics().await?))
}

/// get_topic_by_id
#[utoipa::path(
    get,
    path = "/temas/{id}",
    params(("id" = i64, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Found", body = Topic),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_topic_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Topic>, ApiError> {
    match state.repo.get_topic(id).await? {
        Some(topic) => Ok(Json(topic)),
        None => Err(ApiError::NotFound),
    }
}

/// get_topics_by_description
///
/// [Public Route] Case-insensitive substring search over topic labels.
#[utoipa::path(
    get,
    path = "/temas/descricao/{descricao}",
    params(("descricao" = String, Path, description = "Description search term")),
    responses((status = 200, description = "Matching topics", body = [Topic]))
)]
pub async fn get_topics_by_description(
    State(state): State<AppState>,
    Path(descricao): Path<String>,
) -> Result<Json<Vec<Topic>>, ApiError> {
    Ok(Json(state.repo.get_topics_by_description(&descricao).await?))
}

/// create_topic
#[utoipa::path(
    post,
    path = "/temas",
    request_body = CreateTopicRequest,
    responses(
        (status = 201, description = "Created", body = Topic),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_topic(
    State(state): State<AppState>,
    Json(payload): Json<CreateTopicRequest>,
) -> Result<(StatusCode, Json<Topic>), ApiError> {
    payload.validate()?;
    let topic = state.repo.create_topic(payload).await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

/// update_topic
#[utoipa::path(
    put,
    path = "/temas",
    request_body = UpdateTopicRequest,
    responses(
        (status = 200, description = "Updated", body = Topic),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Unknown topic id")
    )
)]
pub async fn update_topic(
    State(state): State<AppState>,
    Json(payload): Json<UpdateTopicRequest>,
) -> Result<Json<Topic>, ApiError> {
    payload.validate()?;
    match state.repo.update_topic(payload).await? {
        Some(topic) => Ok(Json(topic)),
        None => Err(ApiError::NotFound),
    }
}

/// delete_topic
///
/// [Public Route] Deletes a topic by id. Posts already referencing it are
/// untouched: the topic reference is a write-time precondition, not a
/// store-enforced cascade.
#[utoipa::path(
    delete,
    path = "/temas/{id}",
    params(("id" = i64, Path, description = "Topic ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_topic(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- User Handlers ---

/// register_user
///
/// [Public Route] Registers a new user.
///
/// The login identifier must be unique; a duplicate is rejected with a 400
/// before anything is written. The password is hashed (argon2, salted) before
/// persistence and the response body never carries the credential field.
#[utoipa::path(
    post,
    path = "/usuarios/cadastrar",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 400, description = "Validation failure or duplicate login")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    payload.validate()?;

    if state.repo.get_user_by_login(&payload.login).await?.is_some() {
        return Err(ApiError::BadRequest("Login already in use".to_string()));
    }

    let user = User {
        id: 0, // assigned by the store
        name: payload.name,
        login: payload.login,
        password: auth::hash_password(&payload.password)?,
        photo: payload.photo,
    };

    let created = state.repo.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// login_user
///
/// [Public Route] Authenticates a user and issues a bearer token.
///
/// Unknown login and wrong password are deliberately indistinguishable: both
/// yield a bare 401.
#[utoipa::path(
    post,
    path = "/usuarios/logar",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .repo
        .get_user_by_login(&payload.login)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !auth::verify_password(&payload.password, &user.password) {
        return Err(ApiError::Unauthorized);
    }

    let token = auth::issue_token(&user.login, &state.config)?;

    Ok(Json(LoginResponse {
        id: user.id,
        name: user.name,
        login: user.login,
        photo: user.photo,
        token,
    }))
}

/// update_user
///
/// [Authenticated Route] Updates a user's profile.
///
/// The target id must exist (404 otherwise), and the new login must not
/// belong to a *different* user (400). The supplied password is re-hashed.
#[utoipa::path(
    put,
    path = "/usuarios/atualizar",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Validation failure or duplicate login"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Unknown user id")
    )
)]
pub async fn update_user(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    if state.repo.get_user(payload.id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    payload.validate()?;

    // The login stays unique: it may only collide with the record being updated.
    if let Some(existing) = state.repo.get_user_by_login(&payload.login).await? {
        if existing.id != payload.id {
            return Err(ApiError::BadRequest("Login already in use".to_string()));
        }
    }

    let user = User {
        id: payload.id,
        name: payload.name,
        login: payload.login,
        password: auth::hash_password(&payload.password)?,
        photo: payload.photo,
    };

    match state.repo.update_user(user).await? {
        Some(updated) => Ok(Json(updated)),
        None => Err(ApiError::NotFound),
    }
}

/// get_users
///
/// [Authenticated Route] Lists every registered user. Credential hashes are
/// skipped during serialization, so the response carries public fields only.
#[utoipa::path(
    get,
    path = "/usuarios/all",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_users(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.repo.get_users().await?))
}

/// get_user_by_id
///
/// [Authenticated Route] Retrieves a single user by id; 404 when absent.
#[utoipa::path(
    get,
    path = "/usuarios/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = User),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user_by_id(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    match state.repo.get_user(id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::NotFound),
    }
}
