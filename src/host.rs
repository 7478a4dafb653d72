//! Contract between the rotation session and whatever displays it.

use anyhow::Result;

use crate::hackernews::Story;

pub const LOADING_TEXT: &str = "Loading Hacker News stories...";
pub const NO_STORIES_TEXT: &str = "HN: no stories";
pub const FETCH_FAILED_TEXT: &str = "HN: fetch failed";

/// What a click on the status element does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    None,
    OpenStory,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKind {
    Hidden,
    Loading,
    Story,
    NoStories,
    FetchFailed,
}

/// Snapshot of the single status element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
    pub tooltip: String,
    pub action: ClickAction,
}

impl Status {
    pub fn hidden() -> Self {
        Self {
            kind: StatusKind::Hidden,
            text: String::new(),
            tooltip: String::new(),
            action: ClickAction::None,
        }
    }

    pub fn loading() -> Self {
        Self {
            kind: StatusKind::Loading,
            text: LOADING_TEXT.to_string(),
            tooltip: "Fetching stories from Hacker News".to_string(),
            action: ClickAction::None,
        }
    }

    pub fn story(story: &Story, show_score: bool) -> Self {
        Self {
            kind: StatusKind::Story,
            text: story_text(story, show_score),
            tooltip: format!("{}\n{}", story.title, story.link()),
            action: ClickAction::OpenStory,
        }
    }

    pub fn no_stories() -> Self {
        Self {
            kind: StatusKind::NoStories,
            text: NO_STORIES_TEXT.to_string(),
            tooltip: "No stories found. Click to refresh.".to_string(),
            action: ClickAction::Refresh,
        }
    }

    pub fn fetch_failed() -> Self {
        Self {
            kind: StatusKind::FetchFailed,
            text: FETCH_FAILED_TEXT.to_string(),
            tooltip: "Could not fetch stories. Click to retry.".to_string(),
            action: ClickAction::Refresh,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.kind != StatusKind::Hidden
    }
}

pub fn story_text(story: &Story, show_score: bool) -> String {
    match story.score {
        Some(score) if show_score => format!("{} ({})", story.title, score),
        _ => story.title.clone(),
    }
}

/// Services the host application provides to a session.
pub trait Host {
    fn render(&mut self, status: &Status);
    fn notify_error(&mut self, message: &str);
    fn open_url(&mut self, url: &str) -> Result<()>;
}
