pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod categories;
pub mod orders;
pub mod products;
pub mod profile;
