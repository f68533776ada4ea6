use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::Character;
use crate::http::double_option;

#[derive(Debug, Default, Deserialize)]
pub struct CreateCharacterRequest {
    pub name: Option<String>,
    pub actor: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCharacterRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub actor: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub role: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

impl UpdateCharacterRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.actor.is_none()
            && self.role.is_none()
            && self.description.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct CharacterResponse {
    pub id: i64,
    pub name: String,
    pub actor: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
    pub sitcom_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Character> for CharacterResponse {
    fn from(c: Character) -> Self {
        Self {
            id: c.id,
            name: c.name,
            actor: c.actor,
            role: c.role,
            description: c.description,
            sitcom_id: c.sitcom_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CharacterEnvelope {
    pub message: &'static str,
    pub character: CharacterResponse,
}
