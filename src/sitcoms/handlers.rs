use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use super::{
    dto::{CreateSitcomRequest, SitcomEnvelope, SitcomResponse, UpdateSitcomRequest},
    services,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    http::{JsonBody, MessageResponse, PathParams},
    state::AppState,
};

pub fn sitcom_routes() -> Router<AppState> {
    Router::new()
        .route("/sitcoms", get(list_sitcoms).post(create_sitcom))
        .route(
            "/sitcoms/:id",
            get(get_sitcom).put(update_sitcom).delete(delete_sitcom),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_sitcom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(payload): JsonBody<CreateSitcomRequest>,
) -> Result<(StatusCode, Json<SitcomEnvelope>), AppError> {
    let sitcom = services::create_sitcom(state.store.as_ref(), user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SitcomEnvelope {
            message: "Sitcom created successfully",
            sitcom: sitcom.into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_sitcoms(
    State(state): State<AppState>,
) -> Result<Json<Vec<SitcomResponse>>, AppError> {
    let sitcoms = services::list_sitcoms(state.store.as_ref()).await?;
    Ok(Json(sitcoms.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_sitcom(
    State(state): State<AppState>,
    PathParams(id): PathParams<i64>,
) -> Result<Json<SitcomResponse>, AppError> {
    let sitcom = services::get_sitcom(state.store.as_ref(), id).await?;
    Ok(Json(sitcom.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_sitcom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParams(id): PathParams<i64>,
    JsonBody(payload): JsonBody<UpdateSitcomRequest>,
) -> Result<Json<SitcomEnvelope>, AppError> {
    let sitcom = services::update_sitcom(state.store.as_ref(), id, user_id, payload).await?;
    Ok(Json(SitcomEnvelope {
        message: "Sitcom updated successfully",
        sitcom: sitcom.into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_sitcom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParams(id): PathParams<i64>,
) -> Result<MessageResponse, AppError> {
    services::delete_sitcom(state.store.as_ref(), id, user_id).await?;
    Ok(MessageResponse {
        message: "Sitcom deleted successfully",
    })
}
