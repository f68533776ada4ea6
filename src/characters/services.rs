use tracing::info;

use super::{
    dto::{CreateCharacterRequest, UpdateCharacterRequest},
    repo_types::{Character, CharacterPatch, NewCharacter},
};
use crate::{
    error::AppError,
    sitcoms::services::{find_sitcom, owned_sitcom},
    store::Store,
    validate,
};

const NOT_FOUND: &str = "Character not found or does not belong to this sitcom";

fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND.into())
}

/// Add a character; only the owner of the parent sitcom may do so.
pub async fn create_character(
    store: &dyn Store,
    sitcom_id: i64,
    caller_id: i64,
    payload: CreateCharacterRequest,
) -> Result<Character, AppError> {
    owned_sitcom(
        store,
        sitcom_id,
        caller_id,
        "Forbidden: You can only add characters to sitcoms you created",
    )
    .await?;
    let name = validate::required_text(payload.name, "Character name is required")?;

    let character = store
        .insert_character(NewCharacter {
            sitcom_id,
            name,
            actor: payload.actor,
            role: payload.role,
            description: payload.description,
        })
        .await
        .map_err(|e| AppError::from_repo(e, "Error creating character"))?;
    info!(character_id = character.id, sitcom_id, "character created");
    Ok(character)
}

pub async fn list_characters(store: &dyn Store, sitcom_id: i64) -> Result<Vec<Character>, AppError> {
    find_sitcom(store, sitcom_id).await?;
    Ok(store.list_characters(sitcom_id).await?)
}

pub async fn get_character(
    store: &dyn Store,
    sitcom_id: i64,
    character_id: i64,
) -> Result<Character, AppError> {
    find_sitcom(store, sitcom_id).await?;
    store
        .get_character(sitcom_id, character_id)
        .await?
        .ok_or_else(not_found)
}

pub async fn update_character(
    store: &dyn Store,
    sitcom_id: i64,
    character_id: i64,
    caller_id: i64,
    payload: UpdateCharacterRequest,
) -> Result<Character, AppError> {
    owned_sitcom(
        store,
        sitcom_id,
        caller_id,
        "Forbidden: You can only update characters for sitcoms you created",
    )
    .await?;
    if payload.is_empty() {
        return Err(AppError::InvalidInput("No input data provided".into()));
    }

    let patch = CharacterPatch {
        name: validate::patched_text(payload.name, "Character name cannot be empty")?,
        actor: payload.actor,
        role: payload.role,
        description: payload.description,
    };
    let character = store
        .update_character(sitcom_id, character_id, patch)
        .await
        .map_err(|e| AppError::from_repo(e, "Error updating character"))?
        .ok_or_else(not_found)?;
    info!(character_id, sitcom_id, "character updated");
    Ok(character)
}

pub async fn delete_character(
    store: &dyn Store,
    sitcom_id: i64,
    character_id: i64,
    caller_id: i64,
) -> Result<(), AppError> {
    owned_sitcom(
        store,
        sitcom_id,
        caller_id,
        "Forbidden: You can only delete characters for sitcoms you created",
    )
    .await?;
    let deleted = store
        .delete_character(sitcom_id, character_id)
        .await
        .map_err(|e| AppError::from_repo(e, "Error deleting character"))?;
    if !deleted {
        return Err(not_found());
    }
    info!(character_id, sitcom_id, "character deleted");
    Ok(())
}
