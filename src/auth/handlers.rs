use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{LoginRequest, LoginResponse, ProtectedResponse, RegisterRequest, RegisterResponse},
    extractors::AuthUser,
    services,
};
use crate::{error::AppError, http::JsonBody, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/protected", get(protected))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = services::register(state.store.as_ref(), payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let login = payload
        .username
        .filter(|v| !v.trim().is_empty())
        .or(payload.email)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let password = payload.password.filter(|p| !p.is_empty());
    let (Some(login), Some(password)) = (login, password) else {
        return Err(AppError::InvalidInput(
            "Missing username/email or password".into(),
        ));
    };

    let user_id = services::authenticate(state.store.as_ref(), &login, &password).await?;
    let access_token = state
        .keys
        .sign_access(user_id)
        .map_err(|e| AppError::internal("Error issuing token", e))?;
    Ok(Json(LoginResponse { access_token }))
}

#[instrument(skip_all, fields(user_id))]
pub async fn protected(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProtectedResponse>, AppError> {
    tracing::Span::current().record("user_id", user_id);
    let user = services::current_user(state.store.as_ref(), user_id).await?;
    Ok(Json(ProtectedResponse {
        logged_in_as: user.id.to_string(),
        message: "You have access to this protected route!",
    }))
}

