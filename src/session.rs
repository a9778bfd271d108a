//! Server-side sessions stored in the `sessions` table and keyed by a cookie.
//!
//! The session layer loads the row before the handler runs and writes it back
//! afterwards, but only when something changed.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, sea_query::OnConflict,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entity::sessions::{ActiveModel as SessionActive, Column as SessionCol, Entity as Sessions},
    error::{AppError, AppResult},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "storefront.sid";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionData {
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub admin_id: Option<Uuid>,
    pub admin_name: Option<String>,
    pub csrf_secret: Option<String>,
}

#[derive(Debug)]
struct Inner {
    id: Uuid,
    data: SessionData,
    dirty: bool,
    destroyed: bool,
    /// Id the client presented, when it must be replaced.
    stale_id: Option<Uuid>,
    send_cookie: bool,
}

/// Handle to the current request's session. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Session {
    pub fn fresh() -> Self {
        Self::from_inner(Inner {
            id: Uuid::new_v4(),
            data: SessionData::default(),
            dirty: false,
            destroyed: false,
            stale_id: None,
            send_cookie: true,
        })
    }

    pub fn existing(id: Uuid, data: SessionData) -> Self {
        Self::from_inner(Inner {
            id,
            data,
            dirty: false,
            destroyed: false,
            stale_id: None,
            send_cookie: false,
        })
    }

    fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // a poisoned lock still holds consistent plain data
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn id(&self) -> Uuid {
        self.lock().id
    }

    pub fn user(&self) -> Option<(Uuid, String)> {
        let inner = self.lock();
        inner
            .data
            .user_id
            .map(|id| (id, inner.data.user_name.clone().unwrap_or_default()))
    }

    pub fn admin(&self) -> Option<(Uuid, String)> {
        let inner = self.lock();
        inner
            .data
            .admin_id
            .map(|id| (id, inner.data.admin_name.clone().unwrap_or_default()))
    }

    /// Store the logged-in user under a new session id.
    pub fn login_user(&self, id: Uuid, name: &str) {
        let mut inner = self.lock();
        renew(&mut inner);
        inner.data.user_id = Some(id);
        inner.data.user_name = Some(name.to_string());
        inner.dirty = true;
    }

    pub fn login_admin(&self, id: Uuid, name: &str) {
        let mut inner = self.lock();
        renew(&mut inner);
        inner.data.admin_id = Some(id);
        inner.data.admin_name = Some(name.to_string());
        inner.dirty = true;
    }

    pub fn set_user_name(&self, name: &str) {
        let mut inner = self.lock();
        inner.data.user_name = Some(name.to_string());
        inner.dirty = true;
    }

    /// Secret used to sign CSRF tokens, created on first use.
    pub fn csrf_secret(&self) -> String {
        let mut inner = self.lock();
        if let Some(secret) = &inner.data.csrf_secret {
            return secret.clone();
        }
        let secret = hex::encode(rand::random::<[u8; 32]>());
        inner.data.csrf_secret = Some(secret.clone());
        inner.dirty = true;
        secret
    }

    /// The CSRF secret if one was already issued. Never creates one, so a
    /// visitor that has not asked for a token gets no session row.
    pub fn issued_csrf_secret(&self) -> Option<String> {
        self.lock().data.csrf_secret.clone()
    }

    pub fn destroy(&self) {
        let mut inner = self.lock();
        inner.destroyed = true;
    }
}

fn renew(inner: &mut Inner) {
    if !inner.send_cookie {
        inner.stale_id = Some(inner.id);
    }
    inner.id = Uuid::new_v4();
    inner.send_cookie = true;
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session layer is not installed")))
    }
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

async fn load(state: &AppState, id: Uuid) -> AppResult<Option<SessionData>> {
    let row = Sessions::find_by_id(id)
        .filter(SessionCol::ExpiresAt.gt(Utc::now()))
        .one(&state.orm)
        .await?;

    Ok(row.and_then(|row| serde_json::from_value(row.data).ok()))
}

async fn delete(state: &AppState, id: Uuid) -> AppResult<()> {
    Sessions::delete_by_id(id).exec(&state.orm).await?;
    Ok(())
}

async fn save(state: &AppState, id: Uuid, data: &SessionData) -> AppResult<()> {
    let expires_at = Utc::now() + Duration::hours(state.config.session_ttl_hours);
    let row = SessionActive {
        id: Set(id),
        data: Set(serde_json::to_value(data).map_err(anyhow::Error::from)?),
        expires_at: Set(expires_at.into()),
    };
    Sessions::insert(row)
        .on_conflict(
            OnConflict::column(SessionCol::Id)
                .update_columns([SessionCol::Data, SessionCol::ExpiresAt])
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;
    Ok(())
}

async fn purge_expired(state: &AppState) -> AppResult<u64> {
    let result = Sessions::delete_many()
        .filter(SessionCol::ExpiresAt.lte(Utc::now()))
        .exec(&state.orm)
        .await?;
    if result.rows_affected > 0 {
        tracing::debug!(removed = result.rows_affected, "purged expired sessions");
    }
    Ok(result.rows_affected)
}

fn cookie(id: Uuid, max_age_secs: i64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    ))
    .ok()
}

/// Write the session back and set or clear the cookie.
async fn persist(state: &AppState, session: &Session, response: &mut Response) -> AppResult<()> {
    let (id, data, dirty, destroyed, stale_id, send_cookie) = {
        let inner = session.lock();
        (
            inner.id,
            inner.data.clone(),
            inner.dirty,
            inner.destroyed,
            inner.stale_id,
            inner.send_cookie,
        )
    };

    if let Some(stale) = stale_id {
        delete(state, stale).await?;
    }

    if destroyed {
        delete(state, id).await?;
        if let Some(value) = cookie(id, 0) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        return Ok(());
    }

    if !dirty {
        return Ok(());
    }

    save(state, id, &data).await?;
    if send_cookie {
        // a new session is rare enough to pay for the sweep
        if let Err(err) = purge_expired(state).await {
            tracing::warn!(error = %err, "failed to purge expired sessions");
        }
        if let Some(value) = cookie(id, state.config.session_ttl_hours * 3600) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    Ok(())
}

pub async fn session_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match session_id_from_headers(request.headers()) {
        Some(id) => match load(&state, id).await {
            Ok(Some(data)) => Session::existing(id, data),
            Ok(None) => Session::fresh(),
            Err(err) => {
                tracing::error!(error = %err, "failed to load session");
                Session::fresh()
            }
        },
        None => Session::fresh(),
    };

    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;

    if let Err(err) = persist(&state, &session, &mut response).await {
        tracing::error!(error = %err, session_id = %session.id(), "failed to save session");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_session_id_among_other_cookies() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}; lang=en")).unwrap(),
        );
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn ignores_malformed_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE}=not-a-uuid")).unwrap(),
        );
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn login_rotates_the_session_id() {
        let original = Uuid::new_v4();
        let session = Session::existing(original, SessionData::default());
        session.login_user(Uuid::new_v4(), "Asha");

        let inner = session.lock();
        assert_ne!(inner.id, original);
        assert_eq!(inner.stale_id, Some(original));
        assert!(inner.dirty && inner.send_cookie);
    }

    #[test]
    fn csrf_secret_is_stable_within_a_session() {
        let session = Session::fresh();
        assert_eq!(session.issued_csrf_secret(), None);
        assert!(!session.lock().dirty);
        let first = session.csrf_secret();
        assert_eq!(session.issued_csrf_secret().as_deref(), Some(first.as_str()));
        assert_eq!(first.len(), 64);
        assert_eq!(session.csrf_secret(), first);
    }
}
