//! HTTP client for the source repository's sync API.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use contentsync_model::ContentDocument;
use contentsync_types::SourceIdentifier;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::error::{SyncError, SyncResult};

/// Duplicate of the `Authorization` header for hosts that strip it.
pub const AUTH_HEADER: &str = "X-SF-Sync-Authorization";
/// Query parameter carrying the username in the fallback request.
pub const QUERY_USER: &str = "sf_sync_user";
/// Query parameter carrying the password in the fallback request.
pub const QUERY_PASS: &str = "sf_sync_pass";

/// Fetches transform-ready documents from a source.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetches one content item of `content_type`, by ID or slug.
    async fn fetch_document(
        &self,
        content_type: &str,
        identifier: &SourceIdentifier,
    ) -> SyncResult<ContentDocument>;
}

/// Outcome of a successful connection test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingStatus {
    /// Credentials accepted.
    Connected,
    /// The host answered but the ping route was not found.
    Reachable,
}

/// Raw answer to one GET.
struct Fetched {
    status: StatusCode,
    body: Vec<u8>,
}

/// Source API client using Basic auth with an application password.
pub struct SourceClient {
    config: SourceConfig,
    client: Client,
    api_base: String,
    credential: String,
}

impl SourceClient {
    /// Creates a client. Fails if the config does not validate.
    pub fn new(config: SourceConfig) -> SyncResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {e}")))?;

        let credential = format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", config.username.trim(), config.password()))
        );

        Ok(Self {
            api_base: config.api_base(),
            config,
            client,
            credential,
        })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// URL of the document endpoint for an identifier.
    pub fn document_url(&self, content_type: &str, identifier: &SourceIdentifier) -> String {
        let content_type = urlencoding::encode(content_type);
        match identifier {
            SourceIdentifier::Id(id) => {
                format!("{}/post-type/{content_type}/{id}", self.api_base)
            }
            SourceIdentifier::Slug(slug) => format!(
                "{}/post-type/{content_type}/by-slug/{}",
                self.api_base,
                urlencoding::encode(slug)
            ),
        }
    }

    /// Tests the connection and credentials.
    pub async fn ping(&self) -> SyncResult<PingStatus> {
        let url = format!("{}/ping", self.api_base);
        let timeout = Duration::from_secs(self.config.ping_timeout_secs);
        let fetched = self.get(&url, timeout).await?;

        match fetched.status {
            s if s.is_success() => Ok(PingStatus::Connected),
            StatusCode::NOT_FOUND => Ok(PingStatus::Reachable),
            StatusCode::UNAUTHORIZED => Err(SyncError::Unauthorized),
            s => Err(SyncError::Source { status: s.as_u16() }),
        }
    }

    /// GET with header auth, retried once with query credentials on 401.
    /// The retry is only adopted when it succeeds.
    async fn get(&self, url: &str, timeout: Duration) -> SyncResult<Fetched> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .header(AUTHORIZATION, &self.credential)
            .header(AUTH_HEADER, &self.credential)
            .send()
            .await
            .map_err(|e| network(url, e))?;

        if response.status() == StatusCode::UNAUTHORIZED && self.config.query_auth_fallback {
            debug!("Source rejected header credentials, retrying with query credentials");
            let password = self.config.password();
            let retry = self
                .client
                .get(url)
                .timeout(timeout)
                .query(&[
                    (QUERY_USER, self.config.username.trim()),
                    (QUERY_PASS, password.as_str()),
                ])
                .send()
                .await;

            if let Ok(retry) = retry {
                if retry.status().is_success() {
                    return read(url, retry).await;
                }
            }
        }

        read(url, response).await
    }
}

#[async_trait]
impl DocumentSource for SourceClient {
    async fn fetch_document(
        &self,
        content_type: &str,
        identifier: &SourceIdentifier,
    ) -> SyncResult<ContentDocument> {
        let url = self.document_url(content_type, identifier);
        info!("Fetching source document {}", url);

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let fetched = self.get(&url, timeout).await?;

        match fetched.status {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(SyncError::Unauthorized),
            StatusCode::NOT_FOUND => return Err(SyncError::NotFound { url }),
            s => return Err(SyncError::Source { status: s.as_u16() }),
        }

        Ok(ContentDocument::parse(&fetched.body)?)
    }
}

async fn read(url: &str, response: Response) -> SyncResult<Fetched> {
    let status = response.status();
    let body = response.bytes().await.map_err(|e| network(url, e))?;
    Ok(Fetched {
        status,
        body: body.to_vec(),
    })
}

fn network(url: &str, e: reqwest::Error) -> SyncError {
    SyncError::Network {
        url: url.to_string(),
        message: e.to_string(),
    }
}
