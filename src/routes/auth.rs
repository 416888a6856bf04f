//! Authentication endpoints: register, login, session check, logout

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::{
    clear_session_cookie, hash_password, session_cookie, verify_password, AuthUser,
};
use crate::db::{NewUser, User, UserRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/checkLoggedIn", get(check_logged_in))
        .route("/logout", post(logout))
}

// Missing JSON fields deserialize to empty strings, which fail the
// all-fields-required check the same way absent ones do.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /register - create a user and open a session.
///
/// The session token issued here is scoped to the user id only.
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<User>)> {
    if req.username.is_empty() || req.password.is_empty() || req.email.is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }

    let repo = UserRepository::new(state.db());
    if repo.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let user = repo
        .create(&NewUser {
            username: req.username,
            email: req.email,
            password_hash,
        })
        .await?;

    let token = state.tokens().issue(&user.id, None, None)?;
    tracing::info!("Registered user {}", user.username);

    Ok((jar.add(session_cookie(token)), Json(user)))
}

/// POST /login - verify credentials and open a session.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<User>)> {
    let repo = UserRepository::new(state.db());
    let user = repo
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::BadRequest("User not found".to_string()))?;

    verify_password(&req.password, &user.password_hash)
        .map_err(|_| AppError::BadRequest("Invalid password".to_string()))?;

    let token = state
        .tokens()
        .issue(&user.id, Some(&user.username), Some(&user.email))?;

    Ok((jar.add(session_cookie(token)), Json(user)))
}

/// GET /checkLoggedIn - return the user behind the session cookie.
async fn check_logged_in(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<User>> {
    let repo = UserRepository::new(state.db());
    let user = repo
        .find_by_id(&claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// POST /logout - clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.remove(clear_session_cookie()),
        Json(MessageResponse {
            message: "logout successful".to_string(),
        }),
    )
}
