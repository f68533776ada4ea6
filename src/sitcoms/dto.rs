use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::repo_types::Sitcom;
use crate::http::double_option;

#[derive(Debug, Default, Deserialize)]
pub struct CreateSitcomRequest {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub creator: Option<String>,
    pub years_active: Option<String>, // e.g. "2001-2010" or "2010-Present"
    pub number_of_seasons: Option<Value>,
    pub synopsis: Option<String>,
}

/// Merge patch for a sitcom. `null` clears a nullable field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSitcomRequest {
    pub title: Option<String>,
    pub genre: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub creator: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub years_active: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub number_of_seasons: Option<Option<Value>>,
    #[serde(default, deserialize_with = "double_option")]
    pub synopsis: Option<Option<String>>,
}

impl UpdateSitcomRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.genre.is_none()
            && self.creator.is_none()
            && self.years_active.is_none()
            && self.number_of_seasons.is_none()
            && self.synopsis.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct SitcomResponse {
    pub id: i64,
    pub title: String,
    pub creator: Option<String>,
    pub genre: String,
    pub years_active: Option<String>,
    pub number_of_seasons: Option<i32>,
    pub synopsis: Option<String>,
    pub user_id: i64,
    pub average_rating: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Sitcom> for SitcomResponse {
    fn from(s: Sitcom) -> Self {
        Self {
            id: s.id,
            title: s.title,
            creator: s.creator,
            genre: s.genre,
            years_active: s.years_active,
            number_of_seasons: s.number_of_seasons,
            synopsis: s.synopsis,
            user_id: s.owner_id,
            average_rating: s.average_rating,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SitcomEnvelope {
    pub message: &'static str,
    pub sitcom: SitcomResponse,
}
