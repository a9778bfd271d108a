use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use sea_orm::sea_query::OnConflict;
use uuid::Uuid;

use crate::{
    dto::orders::ReviewRequest,
    entity::{
        products::Entity as Products,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Add a review, or overwrite the user's earlier review of the same product.
pub async fn add_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: ReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest("Invalid review data".into()));
    }

    Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let by_user = Condition::all()
        .add(ReviewCol::UserId.eq(user.user_id))
        .add(ReviewCol::ProductId.eq(product_id));

    // only decides the wording; the upsert below is what keeps one row
    let existed = Reviews::find()
        .filter(by_user.clone())
        .one(&state.orm)
        .await?
        .is_some();

    let message = payload
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    let row = ReviewActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(product_id),
        rating: Set(payload.rating),
        message: Set(message),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };
    Reviews::insert(row)
        .on_conflict(
            OnConflict::columns([ReviewCol::UserId, ReviewCol::ProductId])
                .update_columns([ReviewCol::Rating, ReviewCol::Message, ReviewCol::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;

    let review = Reviews::find()
        .filter(by_user)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("review missing after upsert")))?;

    tracing::info!(user_id = %user.user_id, product_id = %product_id, rating = review.rating, "review saved");

    let notice = if existed {
        "Review updated successfully!"
    } else {
        "Review added successfully!"
    };
    let redirect = match payload.order_id {
        Some(order_id) => format!("/orders/{order_id}"),
        None => format!("/products/{product_id}"),
    };

    Ok(ApiResponse::success(notice, Review::from(review), Some(Meta::empty())).redirect_to(redirect))
}
