//! Session types and resolution against the external identity provider.
//!
//! The session is resolved once per request at the HTTP boundary
//! ([`CurrentSession`]) and handed to the guard in [`crate::authz`] explicitly.

use async_trait::async_trait;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::metrics::SESSION_RESOLVE_SECONDS;
use crate::state::AppState;

/// User role. Wire form is the exact string; anything unknown is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    User,
    Admin,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
            Role::Other(s) => s,
        }
    }
}

// case-sensitive on purpose: "admin" is not ADMIN
impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "USER" => Role::User,
            "ADMIN" => Role::Admin,
            _ => Role::Other(s),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::from(s.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionUser {
    pub fn new(id: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            id: id.into(),
            role,
            name: None,
            email: None,
        }
    }

    /// Role used for authorization; USER when the session carries none.
    pub fn effective_role(&self) -> Role {
        self.role.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl Session {
    pub fn for_user(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            expires: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("identity provider returned status {0}")]
    Status(u16),

    #[error("invalid session payload: {0}")]
    Decode(#[source] reqwest::Error),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        warn!(error = %self, "Session resolution failed");
        let body = serde_json::json!({
            "error": "session_unavailable",
            "message": "Could not resolve the current session.",
        });
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}

/// Source of the caller's session. Returns `None` for anonymous requests.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError>;
}

/// Fetches `{auth_url}/api/auth/session`, forwarding the caller's credentials.
pub struct HttpSessionProvider {
    client: reqwest::Client,
    session_url: String,
    timeout: Duration,
}

impl HttpSessionProvider {
    pub fn new(client: reqwest::Client, auth_url: &str, timeout: Duration) -> Self {
        let base = auth_url.trim_end_matches('/');
        // add http:// if not present
        let base = if base.starts_with("http") {
            base.to_string()
        } else {
            format!("http://{}", base)
        };
        Self {
            client,
            session_url: format!("{}/api/auth/session", base),
            timeout,
        }
    }

    pub fn session_url(&self) -> &str {
        &self.session_url
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        let mut req = self.client.get(&self.session_url).timeout(self.timeout);
        for name in [header::COOKIE, header::AUTHORIZATION] {
            if let Some(value) = headers.get(&name) {
                req = req.header(name, value.clone());
            }
        }

        let res = req.send().await.map_err(SessionError::Request)?;
        if !res.status().is_success() {
            return Err(SessionError::Status(res.status().as_u16()));
        }

        // the provider answers `{}` or `null` when nobody is signed in
        let session: Option<Session> = res.json().await.map_err(SessionError::Decode)?;
        Ok(session.filter(Session::is_authenticated))
    }
}

/// Session of the current request, resolved at most once per request.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<Session>);

impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(cached) = parts.extensions.get::<CurrentSession>() {
            return Ok(cached.clone());
        }

        let timer = SESSION_RESOLVE_SECONDS.start_timer();
        let resolved = state.sessions.resolve(&parts.headers).await;
        timer.observe_duration();

        let current = CurrentSession(resolved?);
        debug!(
            authenticated = current.0.is_some(),
            "Session resolved"
        );
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// Provider returning a fixed session, for tests.
#[cfg(test)]
pub struct StaticSessionProvider(pub Option<Session>);

#[cfg(test)]
#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn resolve(&self, _headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use std::net::SocketAddr;

    #[test]
    fn role_wire_form_is_exact() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""ADMIN""#);
        let parsed: Role = serde_json::from_str(r#""USER""#).unwrap();
        assert_eq!(parsed, Role::User);

        let lower: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(lower, Role::Other("admin".to_string()));
        assert_eq!(serde_json::to_string(&lower).unwrap(), r#""admin""#);
    }

    #[test]
    fn missing_role_defaults_to_user() {
        let user: SessionUser = serde_json::from_str(r#"{"id":"u1"}"#).unwrap();
        assert_eq!(user.role, None);
        assert_eq!(user.effective_role(), Role::User);
    }

    #[test]
    fn empty_session_is_anonymous() {
        let session: Session = serde_json::from_str("{}").unwrap();
        assert!(!session.is_authenticated());

        let session: Session = serde_json::from_str(
            r#"{"user":{"id":"u1","role":"ADMIN","email":"a@b.c"},"expires":"2030-01-01T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.user.unwrap().effective_role(), Role::Admin);
        assert!(session.expires.is_some());
    }

    #[test]
    fn provider_url_is_normalized() {
        let p = HttpSessionProvider::new(
            reqwest::Client::new(),
            "localhost:3000/",
            Duration::from_secs(1),
        );
        assert_eq!(p.session_url(), "http://localhost:3000/api/auth/session");
    }

    async fn spawn_identity_provider() -> SocketAddr {
        async fn session(headers: HeaderMap) -> Response {
            let cookie = headers
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            match cookie {
                "session-token=admin" => Json(serde_json::json!({
                    "user": { "id": "u-admin", "role": "ADMIN" },
                    "expires": "2030-01-01T00:00:00.000Z"
                }))
                .into_response(),
                "session-token=broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                _ => Json(serde_json::json!({})).into_response(),
            }
        }

        let app = Router::new().route("/api/auth/session", get(session));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn cookie(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, value.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn http_provider_forwards_cookie() {
        let addr = spawn_identity_provider().await;
        let provider = HttpSessionProvider::new(
            reqwest::Client::new(),
            &format!("http://{}", addr),
            Duration::from_secs(5),
        );

        let session = provider
            .resolve(&cookie("session-token=admin"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.user.unwrap().id, "u-admin");

        let anonymous = provider.resolve(&HeaderMap::new()).await.unwrap();
        assert!(anonymous.is_none());
    }

    #[tokio::test]
    async fn http_provider_reports_upstream_failure() {
        let addr = spawn_identity_provider().await;
        let provider = HttpSessionProvider::new(
            reqwest::Client::new(),
            &format!("http://{}", addr),
            Duration::from_secs(5),
        );

        let err = provider
            .resolve(&cookie("session-token=broken"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Status(500)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
