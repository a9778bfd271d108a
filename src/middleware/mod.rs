pub mod auth;
pub mod csrf;
