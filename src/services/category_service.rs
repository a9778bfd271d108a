use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::categories::{CategoryList, CategoryRequest, CategoryWithCount},
    entity::{
        categories::{ActiveModel, Column as CategoryCol, Entity as Categories, Model as CategoryModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::Category,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::slugify,
};

const LIST_PATH: &str = "/admin/categories";

/// Products counted against a category match either its id or, for rows
/// created before categories existed, its name.
fn uses_category(category: &CategoryModel) -> Condition {
    Condition::any()
        .add(ProdCol::CategoryId.eq(category.id))
        .add(ProdCol::Category.eq(category.name.clone()))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let categories = Categories::find()
        .order_by_asc(CategoryCol::SortOrder)
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?;

    let counts: HashMap<Uuid, i64> = sqlx::query_as::<_, (Uuid, i64)>(
        r#"
        SELECT c.id, COUNT(p.id) AS product_count
        FROM categories c
        LEFT JOIN products p ON p.category_id = c.id OR p.category = c.name
        GROUP BY c.id
        "#,
    )
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .collect();

    let items: Vec<CategoryWithCount> = categories
        .into_iter()
        .map(|model| CategoryWithCount {
            product_count: counts.get(&model.id).copied().unwrap_or(0),
            category: Category::from(model),
        })
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::new(1, total, total)),
    ))
}

async fn find_category(state: &AppState, id: Uuid) -> AppResult<CategoryModel> {
    Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = find_category(state, id).await?;
    Ok(ApiResponse::success("Category", Category::from(category), None))
}

/// Trimmed name and its slug, after the uniqueness checks. `current` is the
/// category being edited, which may keep its own name.
async fn checked_name(
    state: &AppState,
    req: &CategoryRequest,
    current: Option<Uuid>,
) -> AppResult<(String, String)> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Category name is required".into()));
    }
    let slug = slugify(&name);

    let others = |condition: Condition| {
        let condition = match current {
            Some(id) => condition.add(CategoryCol::Id.ne(id)),
            None => condition,
        };
        Categories::find().filter(condition)
    };

    if others(Condition::all().add(CategoryCol::Name.eq(name.clone())))
        .count(&state.orm)
        .await?
        > 0
    {
        return Err(AppError::BadRequest(
            "Category with this name already exists".into(),
        ));
    }
    if others(Condition::all().add(CategoryCol::Slug.eq(slug.clone())))
        .count(&state.orm)
        .await?
        > 0
    {
        return Err(AppError::BadRequest(
            "Category with similar name already exists".into(),
        ));
    }

    Ok((name, slug))
}

fn description(req: &CategoryRequest) -> Option<String> {
    req.description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

pub async fn create_category(
    state: &AppState,
    req: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let (name, slug) = checked_name(state, &req, None).await?;
    let now = Utc::now();

    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
        description: Set(description(&req)),
        is_active: Set(req.is_active),
        sort_order: Set(req.sort_order.unwrap_or(0)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(category_id = %category.id, name = %category.name, "category created");
    Ok(ApiResponse::success(
        "Category created successfully!",
        Category::from(category),
        None,
    )
    .redirect_to(LIST_PATH))
}

pub async fn update_category(
    state: &AppState,
    id: Uuid,
    req: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let existing = find_category(state, id).await?;
    let (name, slug) = checked_name(state, &req, Some(id)).await?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(name);
    active.slug = Set(slug);
    active.description = Set(description(&req));
    active.is_active = Set(req.is_active);
    active.sort_order = Set(req.sort_order.unwrap_or(0));
    active.updated_at = Set(Utc::now().into());
    let category = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Category updated successfully!",
        Category::from(category),
        None,
    )
    .redirect_to(LIST_PATH))
}

pub async fn delete_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<serde_json::Value>> {
    let category = find_category(state, id).await?;

    let in_use = Products::find()
        .filter(uses_category(&category))
        .count(&state.orm)
        .await?;
    if in_use > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot delete category. {in_use} product(s) are using this category."
        )));
    }

    Categories::delete_by_id(id).exec(&state.orm).await?;
    tracing::info!(category_id = %id, "category deleted");

    Ok(ApiResponse::success(
        "Category deleted successfully!",
        serde_json::json!({ "id": id }),
        None,
    )
    .redirect_to(LIST_PATH))
}
