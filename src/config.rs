use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hackernews::{StoryType, HN_API_BASE, HN_ITEM_URL};

const DEFAULT_ENV_PREFIX: &str = "HN_TICKER";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub ticker: TickerConfig,
    #[serde(default)]
    pub hackernews: HackerNewsConfig,
}

/// Options consulted by the rotation session at every decision point.
///
/// Values are stored as written; floors are applied by the accessor methods.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_items", alias = "maxItems")]
    pub max_items: i64,
    #[serde(default = "default_display_seconds", alias = "displaySeconds")]
    pub display_seconds: i64,
    #[serde(default = "default_gap_seconds", alias = "gapSeconds")]
    pub gap_seconds: i64,
    #[serde(default = "default_refresh_minutes", alias = "refreshMinutes")]
    pub refresh_minutes: i64,
    #[serde(default = "default_show_score", alias = "showScore")]
    pub show_score: bool,
    #[serde(default)]
    pub feed: StoryType,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_items: default_max_items(),
            display_seconds: default_display_seconds(),
            gap_seconds: default_gap_seconds(),
            refresh_minutes: default_refresh_minutes(),
            show_score: default_show_score(),
            feed: StoryType::default(),
        }
    }
}

impl TickerConfig {
    pub fn effective_max_items(&self) -> usize {
        self.max_items.max(1) as usize
    }

    pub fn display_duration(&self) -> Duration {
        Duration::from_secs(self.display_seconds.max(1) as u64)
    }

    pub fn gap_duration(&self) -> Duration {
        Duration::from_secs(self.gap_seconds.max(0) as u64)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs((self.refresh_minutes.max(1) as u64).saturating_mul(60))
    }
}

fn default_enabled() -> bool {
    true
}

fn default_max_items() -> i64 {
    30
}

fn default_display_seconds() -> i64 {
    20
}

fn default_gap_seconds() -> i64 {
    2
}

fn default_refresh_minutes() -> i64 {
    15
}

fn default_show_score() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HackerNewsConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_item_url")]
    pub item_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            item_url: default_item_url(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_api_base() -> String {
    HN_API_BASE.to_string()
}

fn default_item_url() -> String {
    HN_ITEM_URL.to_string()
}

fn default_user_agent() -> String {
    format!("hn-ticker/{}", crate::VERSION)
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    let path = options.config_file.clone().or_else(default_config_path);
    if let Some(path) = path {
        if path.exists() {
            cfg = read_config_file(&path)?;
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    if data.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn apply_env(cfg: &mut Config, prefix: &str) {
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            apply_env_value(cfg, &normalized, value);
        }
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "ticker.enabled" => cfg.ticker.enabled = parse_bool(&value),
        "ticker.max_items" => {
            if let Ok(parsed) = value.trim().parse::<i64>() {
                cfg.ticker.max_items = parsed;
            }
        }
        "ticker.display_seconds" => {
            if let Ok(parsed) = value.trim().parse::<i64>() {
                cfg.ticker.display_seconds = parsed;
            }
        }
        "ticker.gap_seconds" => {
            if let Ok(parsed) = value.trim().parse::<i64>() {
                cfg.ticker.gap_seconds = parsed;
            }
        }
        "ticker.refresh_minutes" => {
            if let Ok(parsed) = value.trim().parse::<i64>() {
                cfg.ticker.refresh_minutes = parsed;
            }
        }
        "ticker.show_score" => cfg.ticker.show_score = parse_bool(&value),
        "ticker.feed" => {
            if let Some(feed) = StoryType::from_key(value.trim()) {
                cfg.ticker.feed = feed;
            }
        }
        "hackernews.api_base" => cfg.hackernews.api_base = value,
        "hackernews.item_url" => cfg.hackernews.item_url = value,
        "hackernews.user_agent" => cfg.hackernews.user_agent = value,
        "hackernews.timeout" => {
            if let Ok(duration) = humantime::parse_duration(value.trim()) {
                cfg.hackernews.timeout = duration;
            }
        }
        _ => {}
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "True" | "yes" | "on")
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hn-ticker").join("config.yaml"))
}
