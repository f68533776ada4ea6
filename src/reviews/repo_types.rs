use sqlx::FromRow;
use time::OffsetDateTime;

/// Review record. At most one per (author, sitcom).
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Review {
    pub id: i64,
    pub score: i32,
    pub text: Option<String>,
    pub author_id: i64,
    pub sitcom_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub author_id: i64,
    pub sitcom_id: i64,
    pub score: i32,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub score: Option<i32>,
    pub text: Option<Option<String>>,
}

impl ReviewPatch {
    pub fn apply(self, review: &mut Review) {
        if let Some(score) = self.score {
            review.score = score;
        }
        if let Some(text) = self.text {
            review.text = text;
        }
    }
}
