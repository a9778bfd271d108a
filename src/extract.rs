//! Body extractors for endpoints that take either a browser form or JSON.

use std::{fmt, str::FromStr};

use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header,
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

use crate::error::AppError;

/// `application/json` bodies go through `Json`, everything else through `Form`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormOrJson<T>(pub T);

impl<S, T> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
            Ok(Self(value))
        }
    }
}

/// Checkbox values: JSON booleans, or `on`/`true`/`1` from a form.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(value)) => value,
        Some(Flag::Text(text)) => {
            matches!(text.trim().to_ascii_lowercase().as_str(), "on" | "true" | "1" | "yes")
        }
        None => false,
    })
}

/// Blank form fields become `None` instead of a parse error. JSON numbers are
/// accepted as well as strings.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let text = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    };
    match text.trim() {
        "" => Ok(None),
        text => T::from_str(text).map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Toggle {
        #[serde(default, deserialize_with = "flag")]
        is_active: bool,
        #[serde(default, deserialize_with = "empty_string_as_none")]
        order_id: Option<Uuid>,
    }

    async fn extract(content_type: &str, body: impl Into<Body>) -> Toggle {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap();
        FormOrJson::<Toggle>::from_request(request, &()).await.unwrap().0
    }

    #[tokio::test]
    async fn form_checkbox_and_blank_fields() {
        let parsed = extract("application/x-www-form-urlencoded", "is_active=on&order_id=").await;
        assert!(parsed.is_active);
        assert!(parsed.order_id.is_none());

        let parsed = extract("application/x-www-form-urlencoded", "").await;
        assert!(!parsed.is_active);
    }

    #[tokio::test]
    async fn json_booleans_and_ids() {
        let id = Uuid::new_v4();
        let body = format!(r#"{{"is_active":true,"order_id":"{id}"}}"#);
        let parsed = extract("application/json", body).await;
        assert!(parsed.is_active);
        assert_eq!(parsed.order_id, Some(id));

        let parsed = extract("application/json", r#"{"is_active":false,"order_id":null}"#).await;
        assert!(!parsed.is_active);
        assert!(parsed.order_id.is_none());
    }
}
