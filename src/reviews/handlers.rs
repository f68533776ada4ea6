use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use super::{
    dto::{CreateReviewRequest, ReviewEnvelope, ReviewResponse, UpdateReviewRequest},
    services,
};
use crate::{
    auth::AuthUser,
    error::AppError,
    http::{JsonBody, MessageResponse, PathParams},
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/sitcoms/:id/reviews", get(list_reviews).post(create_review))
        .route(
            "/sitcoms/:id/reviews/:review_id",
            get(get_review).put(update_review).delete(delete_review),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParams(sitcom_id): PathParams<i64>,
    JsonBody(payload): JsonBody<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewEnvelope>), AppError> {
    let review = services::create_review(state.store.as_ref(), sitcom_id, user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReviewEnvelope {
            message: "Review created successfully",
            review: review.into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    PathParams(sitcom_id): PathParams<i64>,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    let reviews = services::list_reviews(state.store.as_ref(), sitcom_id).await?;
    Ok(Json(reviews.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<AppState>,
    PathParams((sitcom_id, review_id)): PathParams<(i64, i64)>,
) -> Result<Json<ReviewResponse>, AppError> {
    let review = services::get_review(state.store.as_ref(), sitcom_id, review_id).await?;
    Ok(Json(review.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParams((sitcom_id, review_id)): PathParams<(i64, i64)>,
    JsonBody(payload): JsonBody<UpdateReviewRequest>,
) -> Result<Json<ReviewEnvelope>, AppError> {
    let review =
        services::update_review(state.store.as_ref(), sitcom_id, review_id, user_id, payload)
            .await?;
    Ok(Json(ReviewEnvelope {
        message: "Review updated successfully",
        review: review.into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    PathParams((sitcom_id, review_id)): PathParams<(i64, i64)>,
) -> Result<MessageResponse, AppError> {
    services::delete_review(state.store.as_ref(), sitcom_id, review_id, user_id).await?;
    Ok(MessageResponse {
        message: "Review deleted successfully",
    })
}
