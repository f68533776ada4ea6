use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::repo_types::Review;
use crate::http::double_option;

#[derive(Debug, Default, Deserialize)]
pub struct CreateReviewRequest {
    pub score: Option<Value>,
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReviewRequest {
    pub score: Option<Value>,
    #[serde(default, deserialize_with = "double_option")]
    pub text: Option<Option<String>>,
}

impl UpdateReviewRequest {
    pub fn is_empty(&self) -> bool {
        self.score.is_none() && self.text.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: i64,
    pub user_id: i64,
    pub sitcom_id: i64,
    pub score: i32,
    pub text: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            user_id: r.author_id,
            sitcom_id: r.sitcom_id,
            score: r.score,
            text: r.text,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewEnvelope {
    pub message: &'static str,
    pub review: ReviewResponse,
}
