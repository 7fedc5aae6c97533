use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use shared::{
    domain::{UserId, UserRecord},
    error::ApiError,
};
use tracing::debug;
use url::Url;

use crate::error::DirectoryError;

/// Remote source of user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<UserRecord>>;
    async fn delete_by_id(&self, id: &UserId) -> Result<()>;
}

pub struct MissingUserDirectory;

#[async_trait]
impl UserDirectory for MissingUserDirectory {
    async fn fetch_all(&self) -> Result<Vec<UserRecord>> {
        Err(anyhow!("user directory is unavailable"))
    }

    async fn delete_by_id(&self, id: &UserId) -> Result<()> {
        Err(anyhow!("user directory is unavailable; cannot delete {id}"))
    }
}

/// JSON-over-HTTP directory: `GET {base}/users` and `DELETE {base}/users/{id}`.
pub struct HttpUserDirectory {
    http: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpUserDirectory {
    pub fn new(base_url: &str) -> std::result::Result<Self, DirectoryError> {
        let invalid = |reason: String| DirectoryError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let parsed = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("expected an http or https url".to_string()));
        }
        Ok(Self {
            http: Client::new(),
            base_url: parsed,
            auth_token: None,
        })
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, id: Option<&UserId>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("users");
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn users(&self) -> std::result::Result<Vec<UserRecord>, DirectoryError> {
        let res = self
            .authorize(self.http.get(self.endpoint(None)))
            .send()
            .await?;
        let body = ensure_success(res).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn delete_user(&self, id: &UserId) -> std::result::Result<(), DirectoryError> {
        let res = self
            .authorize(self.http.delete(self.endpoint(Some(id))))
            .send()
            .await?;
        ensure_success(res).await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn fetch_all(&self) -> Result<Vec<UserRecord>> {
        Ok(self.users().await?)
    }

    async fn delete_by_id(&self, id: &UserId) -> Result<()> {
        Ok(self.delete_user(id).await?)
    }
}

async fn ensure_success(res: Response) -> std::result::Result<Response, DirectoryError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(DirectoryError::Status {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

/// Prefers the body's `message`, then the status reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(api) = serde_json::from_str::<ApiError>(body) {
        debug!(code = ?api.code, "directory: decoded api error body");
        return api.message;
    }
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}
