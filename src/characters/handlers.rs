use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use super::{
    dto::{CharacterEnvelope, CharacterResponse, CreateCharacterRequest, UpdateCharacterRequest},
    services,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    http::{JsonBody, MessageResponse, PathParams},
    state::AppState,
};

pub fn character_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/sitcoms/:id/characters",
            get(list_characters).post(create_character),
        )
        .route(
            "/sitcoms/:id/characters/:character_id",
            get(get_character)
                .put(update_character)
                .delete(delete_character),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_character(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParams(sitcom_id): PathParams<i64>,
    JsonBody(payload): JsonBody<CreateCharacterRequest>,
) -> Result<(StatusCode, Json<CharacterEnvelope>), AppError> {
    let character =
        services::create_character(state.store.as_ref(), sitcom_id, user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CharacterEnvelope {
            message: "Character created successfully",
            character: character.into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_characters(
    State(state): State<AppState>,
    PathParams(sitcom_id): PathParams<i64>,
) -> Result<Json<Vec<CharacterResponse>>, AppError> {
    let characters = services::list_characters(state.store.as_ref(), sitcom_id).await?;
    Ok(Json(characters.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_character(
    State(state): State<AppState>,
    PathParams((sitcom_id, character_id)): PathParams<(i64, i64)>,
) -> Result<Json<CharacterResponse>, AppError> {
    let character =
        services::get_character(state.store.as_ref(), sitcom_id, character_id).await?;
    Ok(Json(character.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_character(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParams((sitcom_id, character_id)): PathParams<(i64, i64)>,
    JsonBody(payload): JsonBody<UpdateCharacterRequest>,
) -> Result<Json<CharacterEnvelope>, AppError> {
    let character = services::update_character(
        state.store.as_ref(),
        sitcom_id,
        character_id,
        user_id,
        payload,
    )
    .await?;
    Ok(Json(CharacterEnvelope {
        message: "Character updated successfully",
        character: character.into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_character(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParams((sitcom_id, character_id)): PathParams<(i64, i64)>,
) -> Result<MessageResponse, AppError> {
    services::delete_character(state.store.as_ref(), sitcom_id, character_id, user_id).await?;
    Ok(MessageResponse {
        message: "Character deleted successfully",
    })
}
