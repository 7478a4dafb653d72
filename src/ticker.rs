use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::TickerConfig;
use crate::hackernews::{FetchError, Story, StoryType};
use crate::host::{ClickAction, Host, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Showing,
    Gap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Display,
    Gap,
    Refresh,
}

/// An armed timer. `seq` is unique per arming; a firing whose `seq` is no
/// longer armed was cancelled and must be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub kind: TimerKind,
    pub seq: u64,
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Automatic,
}

/// Work order for one fetch. Hand the outcome back through
/// [`Session::complete_refresh`] with the same ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub trigger: Trigger,
    pub story_type: StoryType,
    pub max_items: usize,
}

/// Owned rotation state: story list, cursor, timers and the host it renders to.
pub struct Session<H: Host> {
    config: TickerConfig,
    host: H,
    stories: Vec<Story>,
    cursor: Option<usize>,
    current: Option<Story>,
    phase: Phase,
    status: Status,
    rotation_timer: Option<Timer>,
    refresh_timer: Option<Timer>,
    next_seq: u64,
    generation: u64,
    in_flight: Option<u64>,
}

impl<H: Host> Session<H> {
    pub fn new(config: TickerConfig, host: H) -> Self {
        Self {
            config,
            host,
            stories: Vec::new(),
            cursor: None,
            current: None,
            phase: Phase::Idle,
            status: Status::hidden(),
            rotation_timer: None,
            refresh_timer: None,
            next_seq: 0,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn config(&self) -> &TickerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&Story> {
        self.current.as_ref()
    }

    pub fn rotation_timer(&self) -> Option<Timer> {
        self.rotation_timer
    }

    pub fn refresh_timer(&self) -> Option<Timer> {
        self.refresh_timer
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Initial activation: arms the refresh cadence and starts the first
    /// fetch, or hides the status element when disabled.
    pub fn start(&mut self) -> Option<FetchTicket> {
        if !self.config.enabled {
            self.render(Status::hidden());
            return None;
        }
        self.arm_refresh_timer();
        self.refresh(Trigger::Automatic)
    }

    pub fn refresh(&mut self, trigger: Trigger) -> Option<FetchTicket> {
        if !self.config.enabled {
            debug!(?trigger, "refresh ignored while disabled");
            return None;
        }

        self.cancel_rotation_timer();
        self.phase = Phase::Idle;
        self.current = None;
        self.render(Status::loading());

        self.generation += 1;
        self.in_flight = Some(self.generation);
        info!(?trigger, generation = self.generation, "refreshing stories");

        Some(FetchTicket {
            generation: self.generation,
            trigger,
            story_type: self.config.feed,
            max_items: self.config.effective_max_items(),
        })
    }

    pub fn complete_refresh(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<Vec<Story>, FetchError>,
    ) {
        if ticket.generation != self.generation || self.in_flight != Some(ticket.generation) {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "discarding stale fetch result"
            );
            return;
        }
        self.in_flight = None;

        match outcome {
            Ok(stories) if !stories.is_empty() => {
                info!(count = stories.len(), "installed new story list");
                self.stories = stories;
                self.cursor = None;
                self.show_next();
            }
            Ok(_) => {
                info!("refresh returned no stories");
                self.clear_rotation();
                self.render(Status::no_stories());
            }
            Err(err) => {
                warn!(error = %err, trigger = ?ticket.trigger, "refresh failed");
                // The previous list and cursor survive so a reconfigure can resume them.
                self.cancel_rotation_timer();
                self.current = None;
                self.phase = Phase::Idle;
                self.render(Status::fetch_failed());
                if ticket.trigger == Trigger::Manual {
                    self.host
                        .notify_error(&format!("Failed to fetch Hacker News stories: {err}"));
                }
            }
        }
    }

    /// Delivers a timer firing. Returns a fetch ticket when the refresh
    /// cadence fired.
    pub fn on_timer(&mut self, timer: Timer) -> Option<FetchTicket> {
        match timer.kind {
            TimerKind::Display | TimerKind::Gap => {
                if self.rotation_timer.map(|armed| armed.seq) != Some(timer.seq) {
                    debug!(?timer, "ignoring cancelled rotation timer");
                    return None;
                }
                self.rotation_timer = None;
                match timer.kind {
                    TimerKind::Display => self.enter_gap(),
                    _ => self.show_next(),
                }
                None
            }
            TimerKind::Refresh => {
                if self.refresh_timer.map(|armed| armed.seq) != Some(timer.seq) {
                    debug!(?timer, "ignoring cancelled refresh timer");
                    return None;
                }
                self.arm_refresh_timer();
                self.refresh(Trigger::Automatic)
            }
        }
    }

    pub fn reconfigure(&mut self, config: TickerConfig) -> Option<FetchTicket> {
        let was_enabled = self.config.enabled;
        self.config = config;

        if !self.config.enabled {
            if was_enabled {
                info!("ticker disabled");
            }
            self.disable();
            return None;
        }

        self.arm_refresh_timer();

        if !was_enabled {
            info!("ticker enabled");
            return self.refresh(Trigger::Automatic);
        }

        if !self.stories.is_empty() {
            self.restart_rotation();
            None
        } else if !self.is_fetching() {
            self.refresh(Trigger::Automatic)
        } else {
            None
        }
    }

    /// Opens the displayed story. Does nothing when no story is on screen.
    pub fn open_current(&mut self) {
        if self.phase != Phase::Showing {
            debug!("open requested with no story displayed");
            return;
        }
        let Some(story) = self.current.as_ref() else {
            return;
        };
        let link = story.link().to_string();
        if let Err(err) = self.host.open_url(&link) {
            warn!(url = %link, error = %err, "failed to open story");
            self.host
                .notify_error(&format!("Could not open {link}: {err}"));
        }
    }

    /// Runs the action bound to the status element.
    pub fn click(&mut self) -> Option<FetchTicket> {
        match self.status.action {
            ClickAction::OpenStory => {
                self.open_current();
                None
            }
            ClickAction::Refresh => self.refresh(Trigger::Manual),
            ClickAction::None => None,
        }
    }

    pub fn shutdown(&mut self) {
        self.refresh_timer = None;
        self.disable();
    }

    fn disable(&mut self) {
        self.cancel_rotation_timer();
        self.refresh_timer = None;
        // Invalidate whatever fetch is still running.
        self.generation += 1;
        self.in_flight = None;
        self.clear_rotation();
        self.render(Status::hidden());
    }

    fn clear_rotation(&mut self) {
        self.cancel_rotation_timer();
        self.stories.clear();
        self.cursor = None;
        self.current = None;
        self.phase = Phase::Idle;
    }

    fn show_next(&mut self) {
        if self.stories.is_empty() {
            self.clear_rotation();
            return;
        }
        let next = match self.cursor {
            Some(index) => (index + 1) % self.stories.len(),
            None => 0,
        };
        self.show_at(next);
    }

    fn restart_rotation(&mut self) {
        let index = self.cursor.unwrap_or(0) % self.stories.len();
        debug!(index, "restarting rotation");
        self.show_at(index);
    }

    fn show_at(&mut self, index: usize) {
        self.cancel_rotation_timer();
        let story = self.stories[index].clone();
        debug!(index, id = story.id, "showing story");
        self.render(Status::story(&story, self.config.show_score));
        self.cursor = Some(index);
        self.current = Some(story);
        self.phase = Phase::Showing;
        self.rotation_timer = Some(self.arm(TimerKind::Display, self.config.display_duration()));
    }

    fn enter_gap(&mut self) {
        self.cancel_rotation_timer();
        self.render(Status::hidden());
        self.current = None;
        self.phase = Phase::Gap;
        self.rotation_timer = Some(self.arm(TimerKind::Gap, self.config.gap_duration()));
    }

    fn cancel_rotation_timer(&mut self) {
        self.rotation_timer = None;
    }

    fn arm_refresh_timer(&mut self) {
        self.refresh_timer = Some(self.arm(TimerKind::Refresh, self.config.refresh_interval()));
    }

    fn arm(&mut self, kind: TimerKind, delay: Duration) -> Timer {
        self.next_seq += 1;
        Timer {
            kind,
            seq: self.next_seq,
            delay,
        }
    }

    fn render(&mut self, status: Status) {
        self.host.render(&status);
        self.status = status;
    }
}
