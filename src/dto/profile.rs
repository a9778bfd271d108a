use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::User;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileView {
    pub user: User,
    pub order_count: i64,
}

/// Only the display name can be changed; email and phone are fixed.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(default, alias = "currentPassword")]
    pub current_password: String,
    #[serde(default, alias = "newPassword")]
    pub new_password: String,
    #[serde(default, alias = "confirmPassword")]
    pub confirm_password: String,
}
