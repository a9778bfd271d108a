use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    extract::{empty_string_as_none, flag},
    models::Category,
};

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[schema(value_type = Option<i32>)]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub product_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<CategoryWithCount>,
}
