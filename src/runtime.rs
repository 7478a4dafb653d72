use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{after, never, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::config::TickerConfig;
use crate::data::{self, StorySource};
use crate::hackernews::{FetchError, Story};
use crate::host::{Host, Status};
use crate::ticker::{FetchTicket, Session, Timer, Trigger};

#[derive(Debug)]
enum Command {
    Refresh,
    OpenCurrent,
    Click,
    Reconfigure(TickerConfig),
    Shutdown,
}

struct Fetched {
    ticket: FetchTicket,
    outcome: Result<Vec<Story>, FetchError>,
}

/// Handle to a session running on its own actor thread.
pub struct Ticker {
    commands: Sender<Command>,
    status: Arc<Mutex<Status>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<H>(config: TickerConfig, source: Arc<dyn StorySource>, host: H) -> Result<Self>
    where
        H: Host + Send + 'static,
    {
        let (command_tx, command_rx) = unbounded();
        let status = Arc::new(Mutex::new(Status::hidden()));
        let host = Mirror {
            inner: host,
            status: status.clone(),
        };

        let handle = thread::Builder::new()
            .name("hn-ticker".into())
            .spawn(move || {
                let (fetch_tx, fetch_rx) = unbounded();
                let actor = Actor {
                    session: Session::new(config, host),
                    source,
                    fetch_tx,
                    rotation: TimerSlot::new(),
                    refresh: TimerSlot::new(),
                };
                actor.run(command_rx, fetch_rx);
            })
            .context("ticker: spawn actor thread")?;

        Ok(Self {
            commands: command_tx,
            status,
            handle: Some(handle),
        })
    }

    /// Forces a refresh; failures are reported to the user.
    pub fn refresh(&self) -> Result<()> {
        self.send(Command::Refresh)
    }

    pub fn open_current(&self) -> Result<()> {
        self.send(Command::OpenCurrent)
    }

    pub fn click(&self) -> Result<()> {
        self.send(Command::Click)
    }

    pub fn reconfigure(&self, config: TickerConfig) -> Result<()> {
        self.send(Command::Reconfigure(config))
    }

    /// Last status rendered by the session.
    pub fn status(&self) -> Status {
        self.status.lock().clone()
    }

    pub fn shutdown(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("ticker: actor is not running"))
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Forwards to the real host and keeps a copy of the last status.
struct Mirror<H> {
    inner: H,
    status: Arc<Mutex<Status>>,
}

impl<H: Host> Host for Mirror<H> {
    fn render(&mut self, status: &Status) {
        *self.status.lock() = status.clone();
        self.inner.render(status);
    }

    fn notify_error(&mut self, message: &str) {
        self.inner.notify_error(message);
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        self.inner.open_url(url)
    }
}

/// Channel side of one session timer slot.
struct TimerSlot {
    armed: Option<Timer>,
    rx: Receiver<Instant>,
}

impl TimerSlot {
    fn new() -> Self {
        Self {
            armed: None,
            rx: never(),
        }
    }

    fn sync(&mut self, wanted: Option<Timer>) {
        if self.armed.map(|timer| timer.seq) == wanted.map(|timer| timer.seq) {
            return;
        }
        self.rx = match wanted {
            Some(timer) => after(timer.delay),
            None => never(),
        };
        self.armed = wanted;
    }

    fn fired(&mut self) -> Option<Timer> {
        self.rx = never();
        self.armed.take()
    }
}

struct Actor<H: Host> {
    session: Session<H>,
    source: Arc<dyn StorySource>,
    fetch_tx: Sender<Fetched>,
    rotation: TimerSlot,
    refresh: TimerSlot,
}

impl<H: Host> Actor<H> {
    fn run(mut self, commands: Receiver<Command>, fetches: Receiver<Fetched>) {
        let ticket = self.session.start();
        self.dispatch(ticket);

        loop {
            let rotation_rx = self.rotation.rx.clone();
            let refresh_rx = self.refresh.rx.clone();
            crossbeam_channel::select! {
                recv(commands) -> msg => match msg {
                    Ok(Command::Shutdown) | Err(_) => break,
                    Ok(command) => self.handle(command),
                },
                recv(fetches) -> msg => {
                    if let Ok(done) = msg {
                        self.session.complete_refresh(done.ticket, done.outcome);
                    }
                }
                recv(rotation_rx) -> _ => {
                    if let Some(timer) = self.rotation.fired() {
                        let ticket = self.session.on_timer(timer);
                        self.dispatch(ticket);
                    }
                }
                recv(refresh_rx) -> _ => {
                    if let Some(timer) = self.refresh.fired() {
                        let ticket = self.session.on_timer(timer);
                        self.dispatch(ticket);
                    }
                }
            }
            self.sync_timers();
        }

        self.session.shutdown();
        debug!("ticker actor stopped");
    }

    fn handle(&mut self, command: Command) {
        debug!(?command, "ticker command");
        let ticket = match command {
            Command::Refresh => self.session.refresh(Trigger::Manual),
            Command::OpenCurrent => {
                self.session.open_current();
                None
            }
            Command::Click => self.session.click(),
            Command::Reconfigure(config) => self.session.reconfigure(config),
            Command::Shutdown => None,
        };
        self.dispatch(ticket);
    }

    fn dispatch(&mut self, ticket: Option<FetchTicket>) {
        self.sync_timers();
        let Some(ticket) = ticket else {
            return;
        };
        let source = self.source.clone();
        let tx = self.fetch_tx.clone();
        thread::spawn(move || {
            let outcome = fetch_guarded(source.as_ref(), ticket);
            let _ = tx.send(Fetched { ticket, outcome });
        });
    }

    fn sync_timers(&mut self) {
        self.rotation.sync(self.session.rotation_timer());
        self.refresh.sync(self.session.refresh_timer());
    }
}

/// Runs one fetch and turns a panicking source into an error, so the session
/// always hears back about the ticket it issued.
fn fetch_guarded(source: &dyn StorySource, ticket: FetchTicket) -> Result<Vec<Story>, FetchError> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        data::fetch_top_stories(source, ticket.story_type, ticket.max_items)
    }))
    .unwrap_or_else(|_| {
        error!(generation = ticket.generation, "story fetch panicked");
        Err(FetchError::Aborted)
    })
}
