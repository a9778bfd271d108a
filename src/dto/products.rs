use axum::extract::Multipart;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::csrf::CSRF_FIELD,
    models::Product,
    uploads::ImageUpload,
    validation::ProductInput,
};

#[derive(Serialize, ToSchema)]
pub struct AdminProductList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminProductView {
    #[serde(flatten)]
    pub product: Product,
    pub qr_code_number: Option<String>,
    pub avg_rating: f64,
    pub total_ratings: i64,
}

/// The admin product form, read from a multipart body.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub title: String,
    pub description: String,
    pub price: Option<i64>,
    pub original_price: Option<i64>,
    pub discount_percentage: Option<i32>,
    pub stock: Option<i32>,
    pub category: String,
    pub category_id: Option<Uuid>,
    /// Text value of the `image` field, normally an external URL.
    pub image_url: Option<String>,
    pub image_file: Option<ImageUpload>,
    /// `data:image/...` URL from the in-browser cropper.
    pub cropped_image: Option<String>,
    pub csrf_token: Option<String>,
}

fn number<T: std::str::FromStr>(text: &str) -> Option<T> {
    text.trim().parse().ok()
}

fn non_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

impl ProductForm {
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = ProductForm::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "image" {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                match file_name.filter(|n| !n.is_empty()) {
                    Some(file_name) => {
                        let bytes = field.bytes().await.map_err(bad_multipart)?;
                        // browsers send an empty part when no file was chosen
                        if !bytes.is_empty() {
                            form.image_file = Some(ImageUpload {
                                file_name: Some(file_name),
                                content_type: content_type.unwrap_or_default(),
                                bytes: bytes.to_vec(),
                            });
                        }
                    }
                    None => form.image_url = non_blank(field.text().await.map_err(bad_multipart)?),
                }
                continue;
            }

            let text = field.text().await.map_err(bad_multipart)?;
            match name.as_str() {
                "title" => form.title = text.trim().to_string(),
                "description" => form.description = text.trim().to_string(),
                "price" => form.price = number(&text),
                "original_price" => form.original_price = number(&text),
                "discount_percentage" => form.discount_percentage = number(&text),
                "stock" => form.stock = number(&text),
                "category" => form.category = text.trim().to_string(),
                "category_id" => form.category_id = number(&text),
                "croppedImage" => form.cropped_image = non_blank(text),
                CSRF_FIELD => form.csrf_token = non_blank(text),
                _ => {}
            }
        }

        Ok(form)
    }

    pub fn input(&self) -> ProductInput {
        ProductInput {
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
            stock: self.stock,
            category: self.category.clone(),
        }
    }
}
