use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{EarningEntry, UserRecord};
use crate::service::favorites::FavoriteSet;

use super::{squash_conflict, DataSourceError, EntriesSource, FavoritesSource, UsersSource};

const ENTRIES_PATH: &str = "api/earnings";
const USERS_PATH: &str = "api/users";

#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub timeout: Duration,
}

impl HttpApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            timeout: Duration::from_secs(15),
        }
    }
}

/// Hosted-API client backing all three data-source ports.
///
/// One reqwest client with an explicit timeout; a hung backend surfaces as a
/// `Network` error instead of an indefinite wait.
pub struct HttpApiClient {
    http: reqwest::Client,
    config: HttpApiConfig,
}

impl HttpApiClient {
    pub fn new(config: HttpApiConfig) -> Result<Self, DataSourceError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DataSourceError::Network(format!("failed to build client: {e}")))?;

        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DataSourceError> {
        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DataSourceError::Network(format!("request timed out: {e}"))
            } else {
                DataSourceError::Network(format!("request failed: {e}"))
            }
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "unable to read body".to_string());
        Err(map_error_status(status, body))
    }

    async fn parse<T: for<'de> Deserialize<'de>>(
        resp: Response,
    ) -> Result<T, DataSourceError> {
        let raw = resp
            .bytes()
            .await
            .map_err(|e| DataSourceError::Network(format!("body read failed: {e}")))?;

        serde_json::from_slice(&raw).map_err(|e| {
            let preview = String::from_utf8_lossy(&raw[..raw.len().min(500)]);
            warn!("Failed to parse API response: {}; body preview: {}", e, preview);
            DataSourceError::Parse(e.to_string())
        })
    }
}

fn map_error_status(status: StatusCode, body: String) -> DataSourceError {
    // The hosted backend reports a duplicate insert as a constraint violation
    // rather than a 409; normalize both shapes to Conflict.
    if status == StatusCode::CONFLICT || body.contains("duplicate key") || body.contains("23505")
    {
        return DataSourceError::Conflict(body);
    }
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            DataSourceError::Validation(body)
        }
        _ => DataSourceError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

#[derive(Debug, Serialize)]
struct FavoriteWriteBody<'a> {
    user_id: &'a str,
    ticker: &'a str,
}

#[derive(Debug, Serialize)]
struct ReplaceBody<'a> {
    user_id: &'a str,
    favorites: &'a [String],
}

#[derive(Debug, Serialize)]
struct EnsureUserBody<'a> {
    user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct FavoritesListResponse {
    #[serde(default)]
    favorites: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: Option<UserRecord>,
}

#[async_trait]
impl EntriesSource for HttpApiClient {
    async fn fetch_entries(
        &self,
        identity: Option<&str>,
    ) -> Result<Vec<EarningEntry>, DataSourceError> {
        let mut request = self.authorize(self.http.get(self.url(ENTRIES_PATH)));
        if let Some(user_id) = identity {
            request = request.query(&[("user_id", user_id)]);
        }

        let entries: Vec<EarningEntry> = Self::parse(self.send(request).await?).await?;
        info!("Fetched {} earnings entries", entries.len());
        Ok(entries)
    }
}

#[async_trait]
impl FavoritesSource for HttpApiClient {
    async fn list(&self, identity: &str) -> Result<FavoriteSet, DataSourceError> {
        let request = self
            .authorize(self.http.get(self.url(USERS_PATH)))
            .query(&[("user_id", identity)]);

        match self.send(request).await {
            Ok(resp) => {
                let body: FavoritesListResponse = Self::parse(resp).await?;
                Ok(FavoriteSet::from(body.favorites))
            }
            // No row yet for this identity; an empty set, not an error.
            Err(DataSourceError::Status { status: 404, .. }) => Ok(FavoriteSet::default()),
            Err(err) => Err(err),
        }
    }

    async fn insert(&self, identity: &str, ticker: &str) -> Result<(), DataSourceError> {
        let request = self
            .authorize(self.http.post(self.url(ENTRIES_PATH)))
            .json(&FavoriteWriteBody {
                user_id: identity,
                ticker,
            });

        squash_conflict(self.send(request).await.map(|_| ()))
    }

    async fn delete(&self, identity: &str, ticker: &str) -> Result<(), DataSourceError> {
        let request = self
            .authorize(self.http.delete(self.url(ENTRIES_PATH)))
            .json(&FavoriteWriteBody {
                user_id: identity,
                ticker,
            });

        match self.send(request).await.map(|_| ()) {
            // Deleting a ticker that is already gone is a no-op success.
            Err(DataSourceError::Status { status: 404, .. }) => Ok(()),
            other => squash_conflict(other),
        }
    }

    async fn replace(
        &self,
        identity: &str,
        favorites: &FavoriteSet,
    ) -> Result<FavoriteSet, DataSourceError> {
        let request = self
            .authorize(self.http.put(self.url(USERS_PATH)))
            .json(&ReplaceBody {
                user_id: identity,
                favorites: favorites.tickers(),
            });

        let body: UserEnvelope = Self::parse(self.send(request).await?).await?;
        Ok(body
            .user
            .map(|record| FavoriteSet::from(record.favorites))
            .unwrap_or_else(|| favorites.clone()))
    }
}

#[async_trait]
impl UsersSource for HttpApiClient {
    async fn ensure_user(&self, identity: &str) -> Result<UserRecord, DataSourceError> {
        let request = self
            .authorize(self.http.post(self.url(USERS_PATH)))
            .json(&EnsureUserBody { user_id: identity });

        // A freshly created row can come back as `user: null`; the record
        // contents do not matter beyond existing.
        let body: UserEnvelope = Self::parse(self.send(request).await?).await?;
        Ok(body.user.unwrap_or_else(|| UserRecord {
            user_id: identity.to_string(),
            favorites: Vec::new(),
        }))
    }
}
