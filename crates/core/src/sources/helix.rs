//! Profile image lookup against the platform's user API.

use async_trait::async_trait;
use serde::Deserialize;

use crate::events::pipeline::ProfileLookup;

const DEFAULT_BASE_URL: &str = "https://api.twitch.tv/helix";

/// Looks up profile images over HTTP with an app/user access token.
/// Failures surface as errors and the pipeline proceeds without the image.
#[derive(Debug, Clone)]
pub struct HelixProfileLookup {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    access_token: String,
}

impl HelixProfileLookup {
    pub fn new(client_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: client_id.into(),
            access_token: access_token.into(),
        }
    }

    /// Point at a different API host (tests, mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    data: Vec<HelixUser>,
}

#[derive(Debug, Deserialize)]
struct HelixUser {
    profile_image_url: Option<String>,
}

#[async_trait]
impl ProfileLookup for HelixProfileLookup {
    async fn profile_image_url(&self, user_id: &str) -> anyhow::Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/users", self.base_url))
            .query(&[("id", user_id)])
            .bearer_auth(&self.access_token)
            .header("Client-Id", &self.client_id)
            .send()
            .await?
            .error_for_status()?;

        let body: UsersResponse = response.json().await?;
        Ok(body.data.into_iter().next().and_then(|u| u.profile_image_url))
    }
}
