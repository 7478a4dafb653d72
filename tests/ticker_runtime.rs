use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::Mutex;

use hn_ticker::config::TickerConfig;
use hn_ticker::data::MockStorySource;
use hn_ticker::host::{Host, Status, StatusKind};
use hn_ticker::runtime::Ticker;

#[derive(Clone, Default)]
struct SharedHost {
    rendered: Arc<Mutex<Vec<Status>>>,
    errors: Arc<Mutex<Vec<String>>>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl Host for SharedHost {
    fn render(&mut self, status: &Status) {
        self.rendered.lock().push(status.clone());
    }

    fn notify_error(&mut self, message: &str) {
        self.errors.lock().push(message.to_string());
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

fn fast_config() -> TickerConfig {
    TickerConfig {
        display_seconds: 1,
        gap_seconds: 0,
        ..TickerConfig::default()
    }
}

fn wait_for(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(10));
    }
}

fn story_titles(host: &SharedHost) -> Vec<String> {
    host.rendered
        .lock()
        .iter()
        .filter(|status| status.kind == StatusKind::Story)
        .map(|status| status.text.clone())
        .collect()
}

#[test]
fn rotates_stories_in_ranking_order() {
    let source = MockStorySource::new(vec![1, 2, 3])
        .with_story(1, "One", Some(10))
        .with_story(3, "Three", Some(30));
    let host = SharedHost::default();
    let mut ticker = Ticker::spawn(fast_config(), Arc::new(source), host.clone()).unwrap();

    wait_for("three story renders", || story_titles(&host).len() >= 3);
    ticker.shutdown();

    let titles = story_titles(&host);
    assert_eq!(titles[..3], ["One (10)", "Three (30)", "One (10)"]);
    assert_eq!(
        host.rendered.lock().first().map(|status| status.kind.clone()),
        Some(StatusKind::Loading)
    );
    assert!(host.errors.lock().is_empty());
}

#[test]
fn only_manual_refresh_failures_are_reported() {
    let host = SharedHost::default();
    let ticker = Ticker::spawn(
        fast_config(),
        Arc::new(MockStorySource::failing()),
        host.clone(),
    )
    .unwrap();

    wait_for("fetch failed status", || {
        ticker.status().kind == StatusKind::FetchFailed
    });
    assert!(host.errors.lock().is_empty());

    ticker.refresh().unwrap();
    wait_for("error notification", || !host.errors.lock().is_empty());
    assert_eq!(ticker.status().kind, StatusKind::FetchFailed);
    assert!(host.errors.lock()[0].contains("500"));
}

#[test]
fn disable_hides_and_enable_restarts_from_first_story() {
    let source = MockStorySource::new(vec![1, 2])
        .with_story(1, "One", None)
        .with_story(2, "Two", None);
    let host = SharedHost::default();
    let ticker = Ticker::spawn(fast_config(), Arc::new(source), host.clone()).unwrap();

    wait_for("second story", || story_titles(&host).len() >= 2);
    ticker
        .reconfigure(TickerConfig {
            enabled: false,
            ..fast_config()
        })
        .unwrap();
    wait_for("hidden status", || ticker.status().kind == StatusKind::Hidden);

    host.rendered.lock().clear();
    ticker.reconfigure(fast_config()).unwrap();
    wait_for("story after re-enable", || !story_titles(&host).is_empty());
    assert_eq!(story_titles(&host)[0], "One");

    // A click landing in the zero-length gap does nothing, so retry.
    wait_for("opened story", || {
        ticker.click().unwrap();
        !host.opened.lock().is_empty()
    });
    assert!(host.opened.lock()[0].starts_with("https://example.com/"));
}
