use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "confirmPassword")]
    pub confirm_password: String,
    pub phone: Option<String>,
}

/// Used by both the shopper and the admin login forms.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// What the page shell needs to render the header and sign forms.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionInfo {
    pub user_name: Option<String>,
    pub admin_name: Option<String>,
    pub cart_count: i64,
    pub csrf_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FormPage {
    pub title: &'static str,
    pub csrf_token: String,
}
