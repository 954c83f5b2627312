use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USERNAME: &str = "dino65-dev";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub API error: {status} - {body}")]
    Status { status: StatusCode, body: String },
    #[error("unexpected GitHub response: {0}")]
    Schema(#[from] serde_json::Error),
    #[error("invalid GitHub API URL: {0}")]
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubStats {
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
    pub id: u64,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub twitter_username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub updated_at: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub topics: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_url: String,
    pub username: String,
    pub token: Option<String>,
    /// Bound on one API call, body included.
    pub timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Read-only GitHub REST client for the profile showcase.
///
/// Without a token the public API is used, which GitHub limits to 60
/// requests per hour.
pub struct GithubClient {
    http: Client,
    config: GithubConfig,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub async fn user(&self) -> Result<GithubUser, GithubError> {
        self.get(&format!("users/{}", self.config.username), &[])
            .await
    }

    pub async fn stats(&self) -> Result<GithubStats, GithubError> {
        self.get(&format!("users/{}", self.config.username), &[])
            .await
    }

    pub async fn repositories(&self) -> Result<Vec<Repository>, GithubError> {
        self.get(
            &format!("users/{}/repos", self.config.username),
            &[("sort", "updated"), ("per_page", "50")],
        )
        .await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GithubError> {
        let url = Url::parse_with_params(
            &format!("{}/{}", self.config.api_url.trim_end_matches('/'), path),
            query,
        )
        .map_err(|err| GithubError::Url(err.to_string()))?;

        let mut request = self
            .http
            .get(url)
            .timeout(self.config.timeout)
            .header(USER_AGENT, "folio")
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GithubError::Status { status, body });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
