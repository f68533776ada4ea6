use serde_json::Value;
use tracing::{info, warn};

use super::{
    dto::{CreateReviewRequest, UpdateReviewRequest},
    repo_types::{NewReview, Review, ReviewPatch},
};
use crate::{
    access::{self, Access},
    error::AppError,
    sitcoms::services::find_sitcom,
    store::Store,
    validate,
};

const NOT_FOUND: &str = "Review not found or does not belong to this sitcom";

/// Scores are whole stars from 1 to 5.
fn parse_score(value: &Value) -> Result<i32, AppError> {
    let score = validate::integer(value, "Score must be an integer")?;
    if !(1..=5).contains(&score) {
        return Err(AppError::InvalidInput(
            "Score must be an integer between 1 and 5".into(),
        ));
    }
    Ok(score as i32)
}

/// Fetch a review the caller wrote. A missing review and someone else's review
/// yield the same `NotFound`, so existence is not disclosed.
async fn authored_review(
    store: &dyn Store,
    sitcom_id: i64,
    review_id: i64,
    caller_id: i64,
    action: &str,
) -> Result<Review, AppError> {
    let denied =
        || AppError::NotFound(format!("Review not found or you do not have permission to {action} it"));

    let review = store
        .get_review(sitcom_id, review_id)
        .await?
        .ok_or_else(denied)?;
    match access::review_authorship(caller_id, &review) {
        Access::Allow => Ok(review),
        Access::Deny(reason) => {
            warn!(review_id, caller_id, ?reason, "authorship denied");
            Err(denied())
        }
    }
}

pub async fn create_review(
    store: &dyn Store,
    sitcom_id: i64,
    author_id: i64,
    payload: CreateReviewRequest,
) -> Result<Review, AppError> {
    find_sitcom(store, sitcom_id).await?;
    let score = match payload.score {
        Some(v) if !v.is_null() => parse_score(&v)?,
        _ => return Err(AppError::InvalidInput("Score is required".into())),
    };

    // The (author, sitcom) unique constraint is what rejects a second review.
    let review = store
        .insert_review(NewReview {
            author_id,
            sitcom_id,
            score,
            text: payload.text,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, sitcom_id, author_id, "review rejected");
            AppError::from_repo(e, "Error creating review")
        })?;
    info!(review_id = review.id, sitcom_id, author_id, score, "review created");
    Ok(review)
}

pub async fn list_reviews(store: &dyn Store, sitcom_id: i64) -> Result<Vec<Review>, AppError> {
    find_sitcom(store, sitcom_id).await?;
    Ok(store.list_reviews(sitcom_id).await?)
}

pub async fn get_review(
    store: &dyn Store,
    sitcom_id: i64,
    review_id: i64,
) -> Result<Review, AppError> {
    find_sitcom(store, sitcom_id).await?;
    store
        .get_review(sitcom_id, review_id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))
}

/// Only the author may edit a review, not the sitcom's owner.
pub async fn update_review(
    store: &dyn Store,
    sitcom_id: i64,
    review_id: i64,
    caller_id: i64,
    payload: UpdateReviewRequest,
) -> Result<Review, AppError> {
    find_sitcom(store, sitcom_id).await?;
    authored_review(store, sitcom_id, review_id, caller_id, "update").await?;
    if payload.is_empty() {
        return Err(AppError::InvalidInput("No input data provided".into()));
    }

    let patch = ReviewPatch {
        score: payload
            .score
            .filter(|v| !v.is_null())
            .map(|v| parse_score(&v))
            .transpose()?,
        text: payload.text,
    };
    let review = store
        .update_review(sitcom_id, review_id, patch)
        .await
        .map_err(|e| AppError::from_repo(e, "Error updating review"))?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;
    info!(review_id, sitcom_id, caller_id, "review updated");
    Ok(review)
}

pub async fn delete_review(
    store: &dyn Store,
    sitcom_id: i64,
    review_id: i64,
    caller_id: i64,
) -> Result<(), AppError> {
    find_sitcom(store, sitcom_id).await?;
    authored_review(store, sitcom_id, review_id, caller_id, "delete").await?;
    let deleted = store
        .delete_review(sitcom_id, review_id)
        .await
        .map_err(|e| AppError::from_repo(e, "Error deleting review"))?;
    if !deleted {
        return Err(AppError::NotFound(NOT_FOUND.into()));
    }
    info!(review_id, sitcom_id, caller_id, "review deleted");
    Ok(())
}
