//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout and the current
//! user's profile.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, StatusCode},
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use workout_log_core::domain::{default_training_types, User};
use workout_log_core::ports::PortError;

use crate::web::middleware::{session_token, SESSION_COOKIE};
use crate::web::rest::{port_error, HandlerError};
use crate::web::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

/// Returned on login. `token` is also set as the `session` cookie and may be
/// sent back as `Authorization: Bearer <token>`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

//=========================================================================================
// Signup Validation
//=========================================================================================

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn validate_signup(req: &SignupRequest) -> Result<(), String> {
    if !email_pattern().is_match(req.email.trim()) {
        return Err("Invalid email".to_string());
    }

    let password_len = req.password.chars().count();
    if password_len < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if password_len > 128 {
        return Err("Password is too long".to_string());
    }
    let has_lower = req.password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = req.password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = req.password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err(
            "Password must contain at least one uppercase letter, one lowercase letter and one number"
                .to_string(),
        );
    }

    let name_len = req.name.trim().chars().count();
    if name_len == 0 {
        return Err("Name is required".to_string());
    }
    if name_len > 100 {
        return Err("Name is too long".to_string());
    }
    Ok(())
}

/// Session lifetime and the instant it ends, or `None` if either overflows.
fn session_expiry(now: DateTime<Utc>, ttl_days: i64) -> Option<(Duration, DateTime<Utc>)> {
    let ttl = Duration::try_days(ttl_days)?;
    Some((ttl, now.checked_add_signed(ttl)?))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), HandlerError> {
    validate_signup(&req).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password".to_string())
        })?
        .to_string();

    // 2. Create user in database
    let user = state
        .db
        .create_user(req.email.trim(), req.name.trim(), &password_hash)
        .await
        .map_err(|e| port_error("Failed to create user", e))?;

    // 3. Give the account the default training-type taxonomy
    for training_type in default_training_types() {
        if let Err(e) = state.db.create_training_type(user.id, training_type).await {
            warn!("Failed to seed training type for user {}: {:?}", user.id, e);
        }
    }

    info!("Created user {}", user.id);
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<LoginResponse>), HandlerError> {
    let unauthorized = || (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string());

    // 1. Get user by email
    let user_creds = state
        .db
        .get_user_by_email(req.email.trim())
        .await
        .map_err(|e| {
            warn!("Login failed: {:?}", e);
            unauthorized()
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();
    if !valid {
        return Err(unauthorized());
    }

    // 3. Drop sessions that have run out, then issue an opaque session token
    let now = state.clock.now();
    match state.db.delete_expired_auth_sessions(now).await {
        Ok(0) => {}
        Ok(purged) => info!("Purged {} expired sessions", purged),
        Err(e) => warn!("Failed to purge expired sessions: {:?}", e),
    }

    let token = Uuid::new_v4().to_string();
    let (ttl, expires_at) = session_expiry(now, state.config.session_ttl_days)
        .ok_or_else(|| {
            error!(
                "Session TTL of {} days is out of range",
                state.config.session_ttl_days
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
        })?;

    state
        .db
        .create_auth_session(&token, user_creds.user_id, expires_at)
        .await
        .map_err(|e| port_error("Failed to create session", e))?;

    let user = state
        .db
        .get_user_by_id(user_creds.user_id)
        .await
        .map_err(|e| port_error("Failed to load user", e))?;

    let cookie = format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds()
    );

    info!("User {} logged in", user.id);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, [(HeaderName, String); 1]), HandlerError> {
    let token = session_token(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .db
        .delete_auth_session(token)
        .await
        .map_err(|e| port_error("Failed to logout", e))?;

    let cookie = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

/// GET /auth/me - The authenticated user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid session")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<UserResponse>, HandlerError> {
    let user = state.db.get_user_by_id(user_id).await.map_err(|e| match e {
        // A valid session whose user vanished is still an auth failure.
        PortError::NotFound(_) => {
            (StatusCode::UNAUTHORIZED, "User not found".to_string())
        }
        other => port_error("Failed to load user", other),
    })?;
    Ok(Json(user.into()))
}
