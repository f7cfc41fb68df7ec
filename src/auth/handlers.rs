use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MeResponse, PublicUser, RegisterRequest, RegisterResponse},
        jwt::AuthUser,
        password::{hash_password_blocking, verify_password_blocking},
        repo_types::NewUser,
        validation::{normalize_email, validate_registration},
    },
    db::StoreError,
    error::ApiError,
    extract::ApiJson,
    state::AppState,
};

const EMAIL_TAKEN: &str = "Email already registered";
// Same message for unknown email and wrong password.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let reg = validate_registration(payload).map_err(|msg| {
        warn!(reason = msg, "registration rejected");
        ApiError::validation(msg)
    })?;

    if state.users.find_by_email(&reg.email).await?.is_some() {
        warn!(email = %reg.email, "email already registered");
        return Err(ApiError::conflict(EMAIL_TAKEN));
    }

    let password_hash = hash_password_blocking(reg.password).await?;

    let user = state
        .users
        .create(NewUser {
            name: reg.name,
            email: reg.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => ApiError::conflict(EMAIL_TAKEN),
            other => other.into(),
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "User registered successfully".into(),
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    if !verify_password_blocking(payload.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = state.jwt.sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".into(),
        token,
        expires_in: state.jwt.ttl().as_secs(),
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(%user_id, "token for unknown user");
        ApiError::Unauthorized("Invalid token".into())
    })?;

    Ok(Json(MeResponse {
        success: true,
        user: PublicUser::from(&user),
    }))
}
