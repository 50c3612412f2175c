//! Real-Debrid REST client

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::availability::AvailabilitySet;
use super::retry::{RetryPolicy, retry_request};
use super::{AddedTorrent, AvailableHost, DebridClient, DebridError, RemoteTorrentInfo};
use crate::config::DebridConfig;
use crate::torrent::ContentHash;

/// Bearer-authenticated client for the Real-Debrid REST API.
///
/// Cheap to share behind an `Arc`; it holds no per-torrent state.
#[derive(Debug, Clone)]
pub struct RealDebridClient {
    base_url: Url,
    api_key: String,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl RealDebridClient {
    /// Creates a client from debrid configuration.
    ///
    /// # Errors
    /// - `DebridError::NotConfigured` - Host or API key missing
    /// - `DebridError::UrlParsing` - Host is not a valid URL
    /// - `DebridError::Http` - HTTP client could not be built
    pub fn new(config: &DebridConfig) -> Result<Self, DebridError> {
        let host = config.host.as_deref().ok_or(DebridError::NotConfigured {
            setting: "REALDEBRID_HOST",
        })?;
        let api_key = config.api_key.clone().ok_or(DebridError::NotConfigured {
            setting: "REALDEBRID_API_KEY",
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            base_url: Self::parse_base_url(host)?,
            api_key,
            retry: config.retry,
            client,
        })
    }

    /// Parses the API root, making sure relative joins append to its path.
    fn parse_base_url(host: &str) -> Result<Url, DebridError> {
        let mut url = Url::parse(host)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, DebridError> {
        Ok(self.base_url.join(path)?)
    }

    /// Sends an authenticated request through the retry collaborator.
    async fn execute<F>(&self, endpoint: &str, build: F) -> Result<Response, DebridError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        retry_request(&self.retry, endpoint, || {
            build(&self.client).bearer_auth(&self.api_key).send()
        })
        .await
        .ok_or_else(|| DebridError::RequestFailed {
            endpoint: endpoint.to_string(),
        })
    }

    async fn read_json<T: DeserializeOwned>(
        endpoint: &str,
        response: Response,
    ) -> Result<T, DebridError> {
        response
            .json::<T>()
            .await
            .map_err(|e| DebridError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }

    /// Checks that the API host answers `GET time`.
    ///
    /// # Errors
    /// - `DebridError::RequestFailed` - Host answered with a non-success status
    /// - `DebridError::Http` - Host unreachable
    pub async fn check_host(&self) -> Result<(), DebridError> {
        let response = self.client.get(self.endpoint("time")?).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(DebridError::RequestFailed {
                endpoint: "time".to_string(),
            })
        }
    }

    /// Checks that the API key is accepted by `GET user`.
    ///
    /// # Errors
    /// - `DebridError::Unauthorized` - Key invalid or expired (401)
    /// - `DebridError::AccountLocked` - Account locked (403)
    /// - `DebridError::RequestFailed` - Any other non-success status
    /// - `DebridError::Http` - Host unreachable
    pub async fn check_api_key(&self) -> Result<(), DebridError> {
        let response = self
            .client
            .get(self.endpoint("user")?)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(DebridError::Unauthorized),
            StatusCode::FORBIDDEN => Err(DebridError::AccountLocked),
            _ => Err(DebridError::RequestFailed {
                endpoint: "user".to_string(),
            }),
        }
    }
}

#[async_trait]
impl DebridClient for RealDebridClient {
    async fn instant_availability(
        &self,
        hash: &ContentHash,
    ) -> Result<AvailabilitySet, DebridError> {
        let endpoint = "torrents/instantAvailability";
        let url = self.endpoint(&format!("{endpoint}/{hash}"))?;

        let response = self.execute(endpoint, |client| client.get(url.clone())).await?;
        let body: serde_json::Value = Self::read_json(endpoint, response).await?;
        tracing::debug!(%hash, %body, "Instant availability response");

        Ok(AvailabilitySet::from_response(&body))
    }

    async fn available_hosts(&self) -> Result<Vec<AvailableHost>, DebridError> {
        let endpoint = "torrents/availableHosts";
        let url = self.endpoint(endpoint)?;

        let response = self.execute(endpoint, |client| client.get(url.clone())).await?;
        Self::read_json(endpoint, response).await
    }

    async fn add_torrent(&self, host: &str, torrent: &[u8]) -> Result<AddedTorrent, DebridError> {
        let endpoint = "torrents/addTorrent";
        let url = self.endpoint(endpoint)?;

        let response = self
            .execute(endpoint, |client| {
                client
                    .put(url.clone())
                    .query(&[("host", host)])
                    .body(torrent.to_vec())
            })
            .await?;
        Self::read_json(endpoint, response).await
    }

    async fn add_magnet(&self, host: &str, magnet: &str) -> Result<AddedTorrent, DebridError> {
        let endpoint = "torrents/addMagnet";
        let url = self.endpoint(endpoint)?;

        let response = self
            .execute(endpoint, |client| {
                client
                    .post(url.clone())
                    .query(&[("host", host)])
                    .form(&[("magnet", magnet)])
            })
            .await?;
        Self::read_json(endpoint, response).await
    }

    async fn torrent_info(&self, id: &str) -> Result<RemoteTorrentInfo, DebridError> {
        let endpoint = "torrents/info";
        let url = self.endpoint(&format!("{endpoint}/{id}"))?;

        let response = self.execute(endpoint, |client| client.get(url.clone())).await?;
        Self::read_json(endpoint, response).await
    }

    async fn select_files(&self, id: &str, file_ids: &[String]) -> Result<(), DebridError> {
        let endpoint = "torrents/selectFiles";
        let url = self.endpoint(&format!("{endpoint}/{id}"))?;
        let files = file_ids.join(",");

        self.execute(endpoint, |client| {
            client.post(url.clone()).form(&[("files", files.as_str())])
        })
        .await?;
        Ok(())
    }

    async fn delete_torrent(&self, id: &str) -> Result<(), DebridError> {
        let endpoint = "torrents/delete";
        let url = self.endpoint(&format!("{endpoint}/{id}"))?;

        self.execute(endpoint, |client| client.delete(url.clone()))
            .await?;
        Ok(())
    }
}
