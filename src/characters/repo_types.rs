use sqlx::FromRow;
use time::OffsetDateTime;

/// Character record; always scoped to one sitcom.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub actor: Option<String>,
    pub role: Option<String>, // e.g. "Lead", "Supporting", "Recurring", "Cameo"
    pub description: Option<String>,
    pub sitcom_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCharacter {
    pub sitcom_id: i64,
    pub name: String,
    pub actor: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CharacterPatch {
    pub name: Option<String>,
    pub actor: Option<Option<String>>,
    pub role: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

impl CharacterPatch {
    pub fn apply(self, character: &mut Character) {
        if let Some(name) = self.name {
            character.name = name;
        }
        if let Some(actor) = self.actor {
            character.actor = actor;
        }
        if let Some(role) = self.role {
            character.role = role;
        }
        if let Some(description) = self.description {
            character.description = description;
        }
    }
}
