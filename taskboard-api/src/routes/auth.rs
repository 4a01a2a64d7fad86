/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Create an account and get a token
/// - `POST /api/auth/login` - Exchange credentials for a token
/// - `GET /api/auth/profile` - The caller's `{id, email}`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{normalize_email, CreateUser, User, UserProfile},
};
use validator::Validate;

/// Same message for unknown email and wrong password
const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email is too long")
    )]
    pub email: String,

    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

fn require_credentials(email: &str, password: &str) -> ApiResult<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    Ok(())
}

/// Checks presence, normalizes the email, then validates the normalized form
fn prepare_registration(mut req: RegisterRequest) -> ApiResult<RegisterRequest> {
    require_credentials(&req.email, &req.password)?;
    req.email = normalize_email(&req.email);
    req.validate()?;
    Ok(req)
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    let claims = jwt::Claims::new(user.id, user.email.clone(), state.config.token_lifetime());
    Ok(jwt::create_token(&claims, state.jwt_secret())?)
}

/// Register a new user
///
/// ```text
/// POST /api/auth/register
/// { "email": "user@example.com", "password": "secret" }
/// ```
///
/// Returns `201` with `{message, user: {id, email}, token}`.
///
/// # Errors
///
/// - `400 Bad Request`: missing field or malformed email
/// - `409 Conflict`: email already registered
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(req) = payload?;

    let req = prepare_registration(req)?;
    let email = req.email;
    if User::email_exists(&state.db, &email).await? {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = password::hash_password_blocking(req.password).await?;

    // A concurrent registration surfaces as a unique violation, mapped to 409
    let user = User::create(
        &state.db,
        CreateUser {
            email,
            password_hash,
        },
    )
    .await?;

    let token = issue_token(&state, &user)?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: user.profile(),
            token,
        }),
    ))
}

/// Log in with email and password
///
/// ```text
/// POST /api/auth/login
/// { "email": "user@example.com", "password": "secret" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing field
/// - `401 Unauthorized`: unknown email or wrong password, indistinguishably
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;

    require_credentials(&req.email, &req.password)?;

    let Some(user) = User::find_by_email(&state.db, &req.email).await? else {
        password::verify_dummy_blocking(req.password).await;
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let valid = password::verify_password_blocking(req.password, user.password_hash.clone()).await?;
    if !valid {
        tracing::debug!(user_id = user.id, "Login rejected");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = issue_token(&state, &user)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: user.profile(),
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<UserProfile>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.profile()))
}
