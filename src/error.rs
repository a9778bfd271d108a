use std::sync::OnceLock;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

static EXPOSE_INTERNAL: OnceLock<bool> = OnceLock::new();

/// Include internal error details in 500 responses. Only set in development.
pub fn expose_internal_errors(enabled: bool) {
    let _ = EXPOSE_INTERNAL.set(enabled);
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("{0} has insufficient stock")]
    InsufficientStock(String),

    #[error("{message}")]
    Unauthorized {
        message: &'static str,
        login: &'static str,
    },

    #[error("Invalid security token. Please try again.")]
    InvalidCsrfToken { back: String },

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),

    #[error("{source}")]
    Redirected {
        #[source]
        source: Box<AppError>,
        to: String,
    },
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::EmptyCart | AppError::InsufficientStock(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::InvalidCsrfToken { .. } => StatusCode::FORBIDDEN,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Redirected { source, .. } => source.status(),
        }
    }

    fn redirect(&self) -> Option<String> {
        match self {
            AppError::Unauthorized { login, .. } => Some((*login).to_string()),
            AppError::InvalidCsrfToken { back } => Some(back.clone()),
            AppError::Redirected { to, .. } => Some(to.clone()),
            _ => None,
        }
    }

    fn is_internal(&self) -> bool {
        self.status() == StatusCode::INTERNAL_SERVER_ERROR
    }

    fn detail(&self) -> String {
        match self {
            AppError::DbError(err) => err.to_string(),
            AppError::OrmError(err) => err.to_string(),
            AppError::Internal(err) => format!("{err:#}"),
            AppError::Redirected { source, .. } => source.detail(),
            other => other.to_string(),
        }
    }
}

/// Attach the page a failed request should send the user back to.
pub trait RedirectOnError<T> {
    fn redirect_to(self, path: impl Into<String>) -> AppResult<T>;
}

impl<T> RedirectOnError<T> for AppResult<T> {
    fn redirect_to(self, path: impl Into<String>) -> AppResult<T> {
        self.map_err(|err| match err {
            // guards already know where they send the user
            AppError::Unauthorized { .. } | AppError::InvalidCsrfToken { .. } => err,
            AppError::Redirected { source, .. } => AppError::Redirected {
                source,
                to: path.into(),
            },
            err => AppError::Redirected {
                source: Box::new(err),
                to: path.into(),
            },
        })
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, error) = if self.is_internal() {
            tracing::error!(error = %self.detail(), "request failed");
            let detail = if EXPOSE_INTERNAL.get().copied().unwrap_or(false) {
                self.detail()
            } else {
                GENERIC_FAILURE.to_string()
            };
            (GENERIC_FAILURE.to_string(), detail)
        } else {
            (self.to_string(), self.to_string())
        };

        let body = ApiResponse {
            message,
            data: Some(ErrorData { error }),
            meta: Some(Meta::empty()),
            redirect: self.redirect(),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_wraps_but_keeps_status() {
        let result: AppResult<()> = Err(AppError::EmptyCart);
        let err = result.redirect_to("/cart").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Your cart is empty");
        assert_eq!(err.redirect().as_deref(), Some("/cart"));
    }

    #[test]
    fn guard_redirects_are_not_overridden() {
        let result: AppResult<()> = Err(AppError::Unauthorized {
            message: "Please login to continue",
            login: "/auth/login",
        });
        let err = result.redirect_to("/cart").unwrap_err();
        assert_eq!(err.redirect().as_deref(), Some("/auth/login"));
    }

    #[test]
    fn insufficient_stock_names_the_product() {
        let err = AppError::InsufficientStock("Silk Saree".into());
        assert_eq!(err.to_string(), "Silk Saree has insufficient stock");
    }
}
