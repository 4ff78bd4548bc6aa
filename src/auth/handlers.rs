use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
        services::{self, Credentials, Registration},
    },
    error::{ApiError, AuthError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/auth/login", post(login))
}

/// Unwraps the JSON body, turning axum's rejection (bad syntax, wrong field
/// types, missing content type) into a generic validation error.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload.map(|Json(v)| v).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "malformed request body");
        AuthError::Validation("Invalid request body".into())
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let input = body(payload)
        .and_then(Registration::try_from)
        .map_err(|e| {
            warn!(error = %e, "register rejected");
            ApiError::with("Registration failed")(e)
        })?;

    let user_id = services::register(&state.credentials, state.hash_cost(), input)
        .await
        .map_err(ApiError::with("Registration failed"))?;

    info!(user_id = %user_id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let input = body(payload)
        .and_then(Credentials::try_from)
        .map_err(|e| {
            warn!(error = %e, "login rejected");
            ApiError::with("Login failed")(e)
        })?;

    let user = match services::login(&state.credentials, &state.decoy_hash, input).await {
        Ok(u) => u,
        Err(AuthError::InvalidCredentials) => {
            warn!("login invalid credentials");
            return Err(ApiError::with("Login failed")(AuthError::InvalidCredentials));
        }
        Err(e) => return Err(ApiError::with("Login failed")(e)),
    };

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        user,
    }))
}
