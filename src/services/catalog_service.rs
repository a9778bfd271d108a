//! Storefront product listings. Every listing goes through the same filter
//! builder and is annotated with review ratings in one grouped query per page.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, prelude::DateTimeWithTimeZone,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::catalog::{
        ActiveCategories, CatalogPage, HomePage, LoadMoreResponse, PriceRange, ProductDetails, ProductList,
        ProductReview, QrProductPage,
    },
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        reviews::{self, Column as ReviewCol, Entity as Reviews},
        users::Column as UserCol,
    },
    error::{AppError, AppResult},
    models::{Category, Product, RatedProduct},
    qr,
    response::{ApiResponse, Meta},
    routes::params::{CatalogParams, Listing, ProductSearchQuery, ProductSortBy, SortOrder},
    state::AppState,
};

const HOME_PAGE_SIZE: u64 = 8;
const DEFAULT_PRICE_RANGE: PriceRange = PriceRange { min: 0, max: 10_000 };

pub fn round_rating(avg: f64) -> f64 {
    (avg * 10.0).round() / 10.0
}

fn search_condition(search: &str) -> Condition {
    let pattern = format!("%{search}%");
    Condition::any()
        .add(Expr::col(ProdCol::Title).ilike(pattern.clone()))
        .add(Expr::col(ProdCol::Description).ilike(pattern.clone()))
        .add(Expr::col(ProdCol::Category).ilike(pattern))
}

/// Search, category and price filters, all required to hold.
pub fn product_filter(params: &CatalogParams) -> Condition {
    let mut condition = Condition::all();

    if let Some(search) = params.search.as_deref() {
        condition = condition.add(search_condition(search));
    }
    if !params.categories.is_empty() {
        condition = condition.add(ProdCol::Category.is_in(params.categories.clone()));
    }
    if let Some(min_price) = params.min_price {
        condition = condition.add(ProdCol::Price.gte(min_price));
    }
    if let Some(max_price) = params.max_price {
        condition = condition.add(ProdCol::Price.lte(max_price));
    }

    condition
}

fn sort_column(sort_by: ProductSortBy) -> ProdCol {
    match sort_by {
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::Price => ProdCol::Price,
        ProductSortBy::Title => ProdCol::Title,
    }
}

fn sort_label(sort_by: ProductSortBy) -> &'static str {
    match sort_by {
        ProductSortBy::CreatedAt => "created_at",
        ProductSortBy::Price => "price",
        ProductSortBy::Title => "title",
    }
}

#[derive(FromRow)]
struct RatingRow {
    product_id: Uuid,
    avg_rating: f64,
    total_ratings: i64,
}

/// Average rating (one decimal) and rating count for each product id.
pub async fn rating_summaries(pool: &DbPool, ids: &[Uuid]) -> AppResult<HashMap<Uuid, (f64, i64)>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, RatingRow>(
        r#"
        SELECT product_id, AVG(rating)::FLOAT8 AS avg_rating, COUNT(*) AS total_ratings
        FROM reviews
        WHERE product_id = ANY($1)
        GROUP BY product_id
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.product_id, (round_rating(row.avg_rating), row.total_ratings)))
        .collect())
}

pub async fn with_ratings(state: &AppState, products: Vec<ProductModel>) -> AppResult<Vec<RatedProduct>> {
    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let ratings = rating_summaries(&state.pool, &ids).await?;

    Ok(products
        .into_iter()
        .map(|model| {
            let (avg_rating, total_ratings) = ratings.get(&model.id).copied().unwrap_or((0.0, 0));
            RatedProduct {
                product: Product::from(model),
                avg_rating,
                total_ratings,
            }
        })
        .collect())
}

/// One page of products plus the total matching count.
pub async fn query_products(
    state: &AppState,
    params: &CatalogParams,
    listing: Listing,
) -> AppResult<(Vec<RatedProduct>, i64)> {
    let finder = Products::find().filter(product_filter(params));
    let total = finder.clone().count(&state.orm).await? as i64;

    let (sort_by, sort_order) = params.sort(listing);
    let column = sort_column(sort_by);
    let finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(column),
        SortOrder::Desc => finder.order_by_desc(column),
    };

    let products = finder
        // tie-break so pages never overlap
        .order_by_asc(ProdCol::Id)
        .limit(params.limit() as u64)
        .offset(params.offset() as u64)
        .all(&state.orm)
        .await?;

    Ok((with_ratings(state, products).await?, total))
}

/// Active categories that currently have products, in display order.
pub async fn filter_categories(pool: &DbPool) -> AppResult<Vec<String>> {
    let names: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT c.name
        FROM categories c
        WHERE c.is_active
          AND EXISTS (SELECT 1 FROM products p WHERE p.category = c.name)
        ORDER BY c.sort_order ASC, c.name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(names.into_iter().map(|(name,)| name).collect())
}

/// Category names as stored on products.
pub async fn product_categories(pool: &DbPool) -> AppResult<Vec<String>> {
    let names: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT category FROM products ORDER BY category")
            .fetch_all(pool)
            .await?;
    Ok(names.into_iter().map(|(name,)| name).collect())
}

pub async fn price_range(pool: &DbPool) -> AppResult<PriceRange> {
    let (min, max): (Option<i64>, Option<i64>) =
        sqlx::query_as("SELECT MIN(price), MAX(price) FROM products")
            .fetch_one(pool)
            .await?;
    Ok(PriceRange {
        min: min.unwrap_or(DEFAULT_PRICE_RANGE.min),
        max: max.unwrap_or(DEFAULT_PRICE_RANGE.max),
    })
}

pub async fn catalog_page(
    state: &AppState,
    params: CatalogParams,
    listing: Listing,
) -> AppResult<ApiResponse<CatalogPage>> {
    let params = params.first_page();
    let (products, total) = query_products(state, &params, listing).await?;
    let categories = filter_categories(&state.pool).await?;
    let price_range = price_range(&state.pool).await?;
    let (sort_by, sort_order) = params.sort(listing);

    let page = CatalogPage {
        has_more: total > params.limit(),
        total_products: total,
        products,
        categories,
        selected_categories: params.categories.clone(),
        search_query: params.search.clone().unwrap_or_default(),
        min_price: params.min_price,
        max_price: params.max_price,
        sort_by: sort_label(sort_by).to_string(),
        sort_order: match sort_order {
            SortOrder::Asc => "asc".to_string(),
            SortOrder::Desc => "desc".to_string(),
        },
        price_range,
    };

    let meta = Meta::new(1, params.limit(), total);
    Ok(ApiResponse::success("Products", page, Some(meta)))
}

pub async fn load_more(
    state: &AppState,
    params: CatalogParams,
    listing: Listing,
) -> AppResult<LoadMoreResponse> {
    let (limit, offset) = (params.limit(), params.offset());
    let (products, total) = query_products(state, &params, listing).await?;

    Ok(LoadMoreResponse {
        success: true,
        has_more: offset + limit < total,
        total,
        offset: offset + products.len() as i64,
        products,
    })
}

pub async fn home_page(state: &AppState) -> AppResult<ApiResponse<HomePage>> {
    let newest = Products::find()
        .order_by_desc(ProdCol::CreatedAt)
        .limit(HOME_PAGE_SIZE)
        .all(&state.orm)
        .await?;

    let page = HomePage {
        products: with_ratings(state, newest).await?,
        categories: product_categories(&state.pool).await?,
    };
    Ok(ApiResponse::success("Home", page, Some(Meta::empty())))
}

/// Unpaginated search used by `/products`.
pub async fn list_products(
    state: &AppState,
    query: ProductSearchQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let search = query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let category = query
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && c != "all");

    let mut condition = Condition::all();
    if let Some(search) = search.as_deref() {
        condition = condition.add(search_condition(search));
    }
    if let Some(category) = category.as_deref() {
        condition = condition.add(ProdCol::Category.eq(category));
    }

    let items: Vec<Product> = Products::find()
        .filter(condition)
        .order_by_desc(ProdCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let total = items.len() as i64;
    let data = ProductList {
        items,
        categories: product_categories(&state.pool).await?,
        selected_category: category.unwrap_or_else(|| "all".to_string()),
        search_query: search.unwrap_or_default(),
    };
    Ok(ApiResponse::success("Products", data, Some(Meta::new(1, total, total))))
}

#[derive(Debug, FromQueryResult)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    user_name: String,
    rating: i32,
    message: Option<String>,
    created_at: DateTimeWithTimeZone,
}

/// Reviews of a product with the reviewer's name, newest first.
pub async fn product_reviews(state: &AppState, product_id: Uuid) -> AppResult<Vec<ProductReview>> {
    let rows = Reviews::find()
        .select_only()
        .column(ReviewCol::Id)
        .column(ReviewCol::UserId)
        .column_as(UserCol::Name, "user_name")
        .column(ReviewCol::Rating)
        .column(ReviewCol::Message)
        .column(ReviewCol::CreatedAt)
        .join(JoinType::InnerJoin, reviews::Relation::Users.def())
        .filter(ReviewCol::ProductId.eq(product_id))
        .order_by_desc(ReviewCol::CreatedAt)
        .into_model::<ReviewRow>()
        .all(&state.orm)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| ProductReview {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            rating: row.rating,
            message: row.message,
            created_at: row.created_at.with_timezone(&Utc),
        })
        .collect())
}

pub fn average_rating(reviews: &[ProductReview]) -> (f64, i64) {
    if reviews.is_empty() {
        return (0.0, 0);
    }
    let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    let total = reviews.len() as i64;
    (round_rating(sum as f64 / total as f64), total)
}

pub async fn product_details(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetails>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let reviews = product_reviews(state, product.id).await?;
    let (avg_rating, total_ratings) = average_rating(&reviews);

    Ok(ApiResponse::success(
        "Product",
        ProductDetails {
            product: Product::from(product),
            reviews,
            avg_rating,
            total_ratings,
        },
        None,
    ))
}

pub async fn product_by_qr_code(state: &AppState, code: &str) -> AppResult<ApiResponse<QrProductPage>> {
    if !qr::is_valid_number(code) {
        return Err(AppError::not_found("Product"));
    }

    let product = Products::find()
        .filter(
            Condition::any()
                .add(ProdCol::QrCode.eq(code))
                .add(ProdCol::QrCode.like(format!("%/qrcode/{code}"))),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let reviews = product_reviews(state, product.id).await?;
    let (avg_rating, total_ratings) = average_rating(&reviews);
    let qr_code_number = product.qr_code.as_deref().and_then(qr::extract_number);

    Ok(ApiResponse::success(
        "Product",
        QrProductPage {
            product: Product::from(product),
            qr_code_number,
            reviews,
            avg_rating,
            total_ratings,
        },
        None,
    ))
}

pub async fn active_categories(state: &AppState) -> AppResult<ApiResponse<ActiveCategories>> {
    let categories = Categories::find()
        .filter(CategoryCol::IsActive.eq(true))
        .order_by_asc(CategoryCol::SortOrder)
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();
    Ok(ApiResponse::success(
        "Categories",
        ActiveCategories { categories },
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i32) -> ProductReview {
        ProductReview {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_name: "Asha".into(),
            rating,
            message: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ratings_round_to_one_decimal() {
        assert_eq!(round_rating(4.333_333), 4.3);
        assert_eq!(round_rating(3.75), 3.8);
        assert_eq!(average_rating(&[]), (0.0, 0));
        assert_eq!(average_rating(&[review(5), review(4), review(4)]), (4.3, 3));
    }
}
