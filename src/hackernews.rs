use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::data::StorySource;

pub const HN_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";
pub const HN_ITEM_URL: &str = "https://news.ycombinator.com/item";

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub base_url: Option<String>,
    pub item_url: Option<String>,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoryType {
    #[default]
    Top,
    New,
    Best,
    Ask,
    Show,
    Job,
}

impl StoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryType::Top => "topstories",
            StoryType::New => "newstories",
            StoryType::Best => "beststories",
            StoryType::Ask => "askstories",
            StoryType::Show => "showstories",
            StoryType::Job => "jobstories",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StoryType::Top => "Top",
            StoryType::New => "New",
            StoryType::Best => "Best",
            StoryType::Ask => "Ask HN",
            StoryType::Show => "Show HN",
            StoryType::Job => "Jobs",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "top" => Some(StoryType::Top),
            "new" => Some(StoryType::New),
            "best" => Some(StoryType::Best),
            "ask" => Some(StoryType::Ask),
            "show" => Some(StoryType::Show),
            "job" | "jobs" => Some(StoryType::Job),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("item {0} does not exist")]
    Missing(i64),
    #[error("fetch worker panicked")]
    Aborted,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: String,
    item_url: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("hackernews client user agent required");
        }

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(Duration::from_secs(10)))
                .build()
                .context("hackernews: build http client")?,
        };

        let base_url = config
            .base_url
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| HN_API_BASE.to_string());
        let item_url = config
            .item_url
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| HN_ITEM_URL.to_string());

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            item_url,
        })
    }

    pub fn story_ids(&self, story_type: StoryType) -> Result<Vec<i64>, FetchError> {
        let url = format!("{}/{}.json", self.base_url, story_type.as_str());
        self.get_json(&url)
    }

    pub fn get_item(&self, id: i64) -> Result<Item, FetchError> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        // The API answers unknown ids with a literal `null`.
        let item: Option<Item> = self.get_json(&url)?;
        item.ok_or(FetchError::Missing(id))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl StorySource for Client {
    fn ranking(&self, story_type: StoryType) -> Result<Vec<i64>, FetchError> {
        self.story_ids(story_type)
    }

    fn item(&self, id: i64) -> Result<Item, FetchError> {
        self.get_item(id)
    }

    fn item_url(&self) -> &str {
        &self.item_url
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Item {
    /// Converts a fetched item into a rotation entry. Only titled items of
    /// kind `story` qualify.
    pub fn into_story(self, item_url: &str) -> Option<Story> {
        if self.item_type != "story" {
            return None;
        }

        let title = self.title?;
        if title.trim().is_empty() {
            return None;
        }

        Some(Story {
            id: self.id,
            title,
            url: self.url.filter(|value| !value.trim().is_empty()),
            score: self.score,
            author: self.by,
            permalink: item_page_url(item_url, self.id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    pub title: String,
    pub url: Option<String>,
    pub score: Option<i64>,
    pub author: Option<String>,
    pub permalink: String,
}

impl Story {
    /// Where a click on this story should go.
    pub fn link(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.permalink)
    }
}

pub fn item_page_url(base: &str, id: i64) -> String {
    match Url::parse_with_params(base, &[("id", id.to_string())]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}?id={}", HN_ITEM_URL, id),
    }
}
