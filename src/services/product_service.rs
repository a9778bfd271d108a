//! Admin product management: multipart forms, stored images and QR codes.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, Condition, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    dto::products::{AdminProductList, AdminProductView, ProductForm},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    models::Product,
    qr::{self, QrCode},
    response::{ApiResponse, Meta},
    services::catalog_service::rating_summaries,
    state::AppState,
    uploads::{self, PLACEHOLDER_IMAGE},
    validation::{discount_percentage, validate_product},
};

const LIST_PATH: &str = "/admin/products";
const QR_ATTEMPTS: u32 = 5;

pub async fn list_products(state: &AppState) -> AppResult<ApiResponse<AdminProductList>> {
    let items: Vec<Product> = Products::find()
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Products",
        AdminProductList { items },
        Some(Meta::new(1, total, total)),
    ))
}

async fn find_product(state: &AppState, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

pub async fn view_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<AdminProductView>> {
    let product = find_product(state, id).await?;
    let ratings = rating_summaries(&state.pool, &[product.id]).await?;
    let (avg_rating, total_ratings) = ratings.get(&product.id).copied().unwrap_or((0.0, 0));

    let view = AdminProductView {
        qr_code_number: product.qr_code.as_deref().and_then(qr::extract_number),
        product: Product::from(product),
        avg_rating,
        total_ratings,
    };
    Ok(ApiResponse::success("Product", view, None))
}

/// Price and stock once the form passed validation. The first problem wins.
fn validated(form: &ProductForm) -> AppResult<(i64, i32)> {
    if let Some(first) = validate_product(&form.input()).into_iter().next() {
        return Err(AppError::BadRequest(first));
    }
    match (form.price, form.stock) {
        (Some(price), Some(stock)) => Ok((price, stock)),
        _ => Err(AppError::BadRequest("Price must be a positive number".into())),
    }
}

/// A newly supplied image, in order of precedence: uploaded file, cropped
/// data URL, external URL. `None` when the form carries no new image.
async fn submitted_image(state: &AppState, form: &ProductForm) -> AppResult<Option<String>> {
    let upload_dir = &state.config.upload_dir;
    if let Some(file) = &form.image_file {
        return uploads::save_upload(upload_dir, file).await.map(Some);
    }
    if let Some(data_url) = form
        .cropped_image
        .as_deref()
        .filter(|d| d.starts_with("data:image"))
    {
        return uploads::save_data_url(upload_dir, data_url).await.map(Some);
    }
    Ok(form
        .image_url
        .clone()
        .filter(|url| url.starts_with("http")))
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn active_model(form: &ProductForm, price: i64, stock: i32, image: String) -> ActiveModel {
    ActiveModel {
        title: Set(form.title.clone()),
        description: Set(form.description.clone()),
        price: Set(price),
        original_price: Set(form.original_price),
        discount_percentage: Set(discount_percentage(
            price,
            form.original_price,
            form.discount_percentage,
        )),
        image: Set(Some(image)),
        stock: Set(stock),
        category: Set(form.category.clone()),
        category_id: Set(form.category_id),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    }
}

fn with_qr(mut active: ActiveModel, code: &QrCode) -> ActiveModel {
    active.qr_code = Set(Some(code.url.clone()));
    active.qr_code_image = Set(Some(code.image_url.clone()));
    active
}

/// Insert, drawing a fresh QR code whenever the unique index rejects one.
async fn insert_with_qr(state: &AppState, base: ActiveModel) -> AppResult<ProductModel> {
    let mut attempt = 1;
    loop {
        let code = qr::generate(&state.config.base_url);
        match with_qr(base.clone(), &code).insert(&state.orm).await {
            Ok(product) => return Ok(product),
            Err(err) if attempt < QR_ATTEMPTS && is_unique_violation(&err) => {
                tracing::warn!(qr_code = %code.number, attempt, "qr code collision, regenerating");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

async fn update_with_qr(state: &AppState, base: ActiveModel) -> AppResult<ProductModel> {
    let mut attempt = 1;
    loop {
        let code = qr::generate(&state.config.base_url);
        match with_qr(base.clone(), &code).update(&state.orm).await {
            Ok(product) => return Ok(product),
            Err(err) if attempt < QR_ATTEMPTS && is_unique_violation(&err) => {
                tracing::warn!(qr_code = %code.number, attempt, "qr code collision, regenerating");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

pub async fn create_product(state: &AppState, form: ProductForm) -> AppResult<ApiResponse<Product>> {
    let (price, stock) = validated(&form)?;
    let image = submitted_image(state, &form).await?;

    let now = Utc::now();
    let mut base = active_model(
        &form,
        price,
        stock,
        image.clone().unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
    );
    base.id = Set(Uuid::new_v4());
    base.created_at = Set(now.into());

    let product = match insert_with_qr(state, base).await {
        Ok(product) => product,
        Err(err) => {
            if let Some(image) = image.filter(|i| uploads::is_local(i)) {
                uploads::remove_image(&state.config.upload_dir, &image).await;
            }
            return Err(err);
        }
    };

    tracing::info!(product_id = %product.id, title = %product.title, "product created");
    Ok(
        ApiResponse::success("Product created successfully!", Product::from(product), None)
            .redirect_to(LIST_PATH),
    )
}

pub async fn update_product(
    state: &AppState,
    id: Uuid,
    form: ProductForm,
) -> AppResult<ApiResponse<Product>> {
    let (price, stock) = validated(&form)?;
    let existing = find_product(state, id).await?;
    let replacement = submitted_image(state, &form).await?;

    let old_image = existing.image.clone();
    let image = replacement
        .clone()
        .or_else(|| old_image.clone())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    let mut base = active_model(&form, price, stock, image);
    base.id = Unchanged(existing.id);

    let product = if needs_qr_code(existing.qr_code.as_deref()) {
        update_with_qr(state, base).await?
    } else {
        base.update(&state.orm).await?
    };

    if let (Some(_), Some(old)) = (&replacement, &old_image) {
        if uploads::is_local(old) && Some(old) != replacement.as_ref() {
            uploads::remove_image(&state.config.upload_dir, old).await;
        }
    }

    tracing::info!(product_id = %product.id, "product updated");
    Ok(
        ApiResponse::success("Product updated successfully!", Product::from(product), None)
            .redirect_to(LIST_PATH),
    )
}

/// Missing, blank, or a leftover barcode path from before QR codes.
pub fn needs_qr_code(stored: Option<&str>) -> bool {
    match stored.map(str::trim) {
        None | Some("") => true,
        Some(code) => code.contains("barcode"),
    }
}

fn missing_qr() -> Condition {
    Condition::any()
        .add(Column::QrCode.is_null())
        .add(Column::QrCode.eq(""))
        .add(Column::QrCode.like("%barcode%"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrStatus {
    pub total: u64,
    pub missing: u64,
}

impl QrStatus {
    pub fn with_qr(&self) -> u64 {
        self.total.saturating_sub(self.missing)
    }
}

pub async fn qr_status(state: &AppState) -> AppResult<QrStatus> {
    let total = Products::find().count(&state.orm).await?;
    let missing = Products::find().filter(missing_qr()).count(&state.orm).await?;
    Ok(QrStatus { total, missing })
}

pub async fn products_missing_qr(state: &AppState) -> AppResult<Vec<ProductModel>> {
    Ok(Products::find()
        .filter(missing_qr())
        .order_by_asc(Column::CreatedAt)
        .all(&state.orm)
        .await?)
}

/// Give an existing product a fresh QR code, leaving every other field alone.
pub async fn assign_qr_code(state: &AppState, id: Uuid) -> AppResult<ProductModel> {
    let base = ActiveModel {
        id: Unchanged(id),
        updated_at: Set(Utc::now().into()),
        ..Default::default()
    };
    match update_with_qr(state, base).await {
        Err(AppError::OrmError(DbErr::RecordNotUpdated)) => Err(AppError::not_found("Product")),
        other => other,
    }
}

pub async fn delete_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Product"));
    }

    tracing::info!(product_id = %id, "product deleted");
    Ok(ApiResponse::success(
        "Product deleted successfully!",
        serde_json::json!({ "id": id }),
        None,
    )
    .redirect_to(LIST_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            title: "Silk Saree".into(),
            description: "Handwoven silk with zari border".into(),
            price: Some(7500),
            original_price: Some(10000),
            stock: Some(3),
            category: "Silk".into(),
            ..Default::default()
        }
    }

    #[test]
    fn validation_reports_the_first_problem() {
        let mut bad = form();
        bad.title = "ab".into();
        bad.price = None;
        let err = validated(&bad).unwrap_err();
        assert_eq!(err.to_string(), "Title must be at least 3 characters");
        assert_eq!(validated(&form()).unwrap(), (7500, 3));
    }

    #[test]
    fn active_model_derives_discount_from_original_price() {
        let active = active_model(&form(), 7500, 3, PLACEHOLDER_IMAGE.into());
        assert_eq!(active.discount_percentage, Set(25));
        assert_eq!(active.image, Set(Some(PLACEHOLDER_IMAGE.to_string())));
    }

    #[test]
    fn blank_and_barcode_values_need_a_qr_code() {
        assert!(needs_qr_code(None));
        assert!(needs_qr_code(Some("  ")));
        assert!(needs_qr_code(Some("/products/barcode/123")));
        assert!(!needs_qr_code(Some("http://localhost:3000/products/qrcode/SHC123")));
    }

    #[test]
    fn qr_code_is_stored_as_deep_link() {
        let code = qr::for_number("http://localhost:3000", "SHC123");
        let active = with_qr(active_model(&form(), 7500, 3, PLACEHOLDER_IMAGE.into()), &code);
        assert_eq!(
            active.qr_code,
            Set(Some("http://localhost:3000/products/qrcode/SHC123".to_string()))
        );
    }
}
