pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod qr;
pub mod response;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod uploads;
pub mod validation;
