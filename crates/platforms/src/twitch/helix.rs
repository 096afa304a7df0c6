use std::fmt;

use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::debug;
use url::Url;

use super::models::{Category, ChannelPatch, HelixResponse};
use crate::client::ApiClient;
use crate::error::ApiError;

/// Credentials for the Helix API.
#[derive(Clone)]
pub struct HelixCredentials {
    pub client_id: String,
    pub access_token: String,
    /// User id of the channel being updated.
    pub broadcaster_id: String,
}

impl fmt::Debug for HelixCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelixCredentials")
            .field("client_id", &self.client_id)
            .field("access_token", &"<redacted>")
            .field("broadcaster_id", &self.broadcaster_id)
            .finish()
    }
}

/// Twitch Helix client limited to category search and channel updates.
pub struct HelixClient {
    api: ApiClient,
    base_url: String,
    broadcaster_id: String,
}

impl HelixClient {
    pub const BASE_URL: &str = "https://api.twitch.tv/helix";

    pub fn new(client: Client, credentials: &HelixCredentials) -> Result<Self, ApiError> {
        let mut api = ApiClient::new("Twitch", client);
        api.try_add_header("Client-ID", &credentials.client_id)?;
        api.try_add_header(
            reqwest::header::AUTHORIZATION.as_str(),
            format!("Bearer {}", credentials.access_token),
        )?;
        api.add_header_typed(reqwest::header::CONTENT_TYPE, "application/json");

        Ok(Self {
            api,
            base_url: Self::BASE_URL.to_string(),
            broadcaster_id: credentials.broadcaster_id.clone(),
        })
    }

    /// Point the client at another Helix-compatible endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)?;
        self.base_url = parsed.as_str().trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn broadcaster_id(&self) -> &str {
        &self.broadcaster_id
    }

    fn search_request(&self, name: &str) -> RequestBuilder {
        self.api
            .get(&format!("{}/games", self.base_url))
            .query(&[("name", name)])
    }

    fn patch_request(&self, patch: &ChannelPatch) -> RequestBuilder {
        self.api
            .patch(&format!("{}/channels", self.base_url))
            .query(&[("broadcaster_id", self.broadcaster_id.as_str())])
            .json(patch)
    }

    /// Look a category up by its exact name.
    ///
    /// Returns the first result, or `None` when the platform knows no such
    /// category. Anything but `200 OK` is an error.
    pub async fn search_category(&self, name: &str) -> Result<Option<Category>, ApiError> {
        let response = self.search_request(name).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(ApiError::UnexpectedStatus { status, body });
        }

        let response: HelixResponse<Category> = serde_json::from_str(&body)?;
        debug!(name, results = response.data.len(), "Category search finished");
        Ok(response.data.into_iter().next())
    }

    /// Apply a partial update to the channel. Succeeds only on `204 No Content`.
    pub async fn patch_channel(&self, patch: &ChannelPatch) -> Result<(), ApiError> {
        if patch.is_empty() {
            return Err(ApiError::Other("empty channel patch".to_string()));
        }

        let response = self.patch_request(patch).send().await?;
        let status = response.status();

        if status != StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::UnexpectedStatus { status, body });
        }

        debug!(broadcaster_id = %self.broadcaster_id, ?patch, "Channel patched");
        Ok(())
    }
}
