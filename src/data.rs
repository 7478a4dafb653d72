use std::collections::HashMap;
use std::thread;

use tracing::{debug, info, warn};

use crate::hackernews::{FetchError, Item, Story, StoryType, HN_ITEM_URL};

/// Read access to the ranking and item endpoints.
pub trait StorySource: Send + Sync {
    fn ranking(&self, story_type: StoryType) -> Result<Vec<i64>, FetchError>;
    fn item(&self, id: i64) -> Result<Item, FetchError>;

    /// Base of the canonical item page used when a story has no url.
    fn item_url(&self) -> &str {
        HN_ITEM_URL
    }
}

/// Fetches the ranked ids, then every item detail concurrently.
///
/// Only the ranking request can fail the call. Per-item failures drop that
/// slot, and the result keeps ranking order whatever order the item
/// requests finish in.
pub fn fetch_top_stories(
    source: &dyn StorySource,
    story_type: StoryType,
    max_items: usize,
) -> Result<Vec<Story>, FetchError> {
    let mut ids = source.ranking(story_type).inspect_err(|err| {
        warn!(feed = story_type.as_str(), error = %err, "ranking request failed");
    })?;
    ids.truncate(max_items.max(1));

    let slots: Vec<Option<Story>> = thread::scope(|scope| {
        let handles: Vec<_> = ids
            .iter()
            .map(|&id| scope.spawn(move || fetch_story(source, id)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or(None))
            .collect()
    });

    let requested = slots.len();
    let stories: Vec<Story> = slots.into_iter().flatten().collect();
    info!(
        feed = story_type.as_str(),
        requested,
        kept = stories.len(),
        "fetched stories"
    );
    Ok(stories)
}

fn fetch_story(source: &dyn StorySource, id: i64) -> Option<Story> {
    match source.item(id) {
        Ok(item) => {
            let story = item.into_story(source.item_url());
            if story.is_none() {
                debug!(id, "item is not a titled story");
            }
            story
        }
        Err(err) => {
            debug!(id, error = %err, "item request failed");
            None
        }
    }
}

/// In-memory source for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MockStorySource {
    ranking: Vec<i64>,
    items: HashMap<i64, Item>,
    fail_ranking: bool,
}

impl MockStorySource {
    pub fn new(ranking: Vec<i64>) -> Self {
        Self {
            ranking,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_ranking: true,
            ..Self::default()
        }
    }

    pub fn with_story(mut self, id: i64, title: &str, score: Option<i64>) -> Self {
        self.items.insert(
            id,
            Item {
                id,
                item_type: "story".into(),
                by: Some("hn-ticker".into()),
                url: Some(format!("https://example.com/{id}")),
                score,
                title: Some(title.into()),
            },
        );
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.insert(item.id, item);
        self
    }
}

impl StorySource for MockStorySource {
    fn ranking(&self, story_type: StoryType) -> Result<Vec<i64>, FetchError> {
        if self.fail_ranking {
            return Err(FetchError::Status {
                url: format!("mock://{}", story_type.as_str()),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        Ok(self.ranking.clone())
    }

    fn item(&self, id: i64) -> Result<Item, FetchError> {
        self.items.get(&id).cloned().ok_or(FetchError::Missing(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSource {
        inner: MockStorySource,
        item_calls: AtomicUsize,
        jitter: bool,
    }

    impl CountingSource {
        fn new(inner: MockStorySource) -> Self {
            Self {
                inner,
                item_calls: AtomicUsize::new(0),
                jitter: false,
            }
        }
    }

    impl StorySource for CountingSource {
        fn ranking(&self, story_type: StoryType) -> Result<Vec<i64>, FetchError> {
            self.inner.ranking(story_type)
        }

        fn item(&self, id: i64) -> Result<Item, FetchError> {
            self.item_calls.fetch_add(1, Ordering::SeqCst);
            if self.jitter {
                let millis = rand::thread_rng().gen_range(0..15);
                thread::sleep(Duration::from_millis(millis));
            }
            self.inner.item(id)
        }
    }

    fn numbered(count: i64) -> MockStorySource {
        (1..=count).fold(MockStorySource::new((1..=count).collect()), |source, id| {
            source.with_story(id, &format!("Story {id}"), Some(id * 10))
        })
    }

    #[test]
    fn requests_at_most_max_items_details() {
        for (ranked, max, expected) in [(10, 3, 3), (2, 30, 2), (5, 0, 1), (5, -4, 1), (0, 5, 0)] {
            let source = CountingSource::new(numbered(ranked));
            let max = (max as i64).max(1) as usize;
            fetch_top_stories(&source, StoryType::Top, max).unwrap();
            assert_eq!(
                source.item_calls.load(Ordering::SeqCst),
                expected,
                "ranked={ranked} max={max}"
            );
        }
    }

    #[test]
    fn zero_max_items_still_fetches_one() {
        let source = CountingSource::new(numbered(4));
        let stories = fetch_top_stories(&source, StoryType::Top, 0).unwrap();
        assert_eq!(source.item_calls.load(Ordering::SeqCst), 1);
        assert_eq!(stories.len(), 1);
    }

    #[test]
    fn keeps_ranking_order_regardless_of_completion_order() {
        let mut source = CountingSource::new(numbered(25));
        source.jitter = true;
        for _ in 0..5 {
            let stories = fetch_top_stories(&source, StoryType::Top, 25).unwrap();
            let ids: Vec<i64> = stories.iter().map(|story| story.id).collect();
            assert_eq!(ids, (1..=25).collect::<Vec<_>>());
        }
    }

    #[test]
    fn filters_failed_untitled_and_non_story_items() {
        let source = MockStorySource::new(vec![1, 2, 3, 4, 5, 6])
            .with_story(1, "First", None)
            .with_item(Item {
                id: 3,
                item_type: "job".into(),
                by: None,
                url: None,
                score: None,
                title: Some("Hiring".into()),
            })
            .with_item(Item {
                id: 4,
                item_type: "story".into(),
                by: None,
                url: None,
                score: Some(4),
                title: None,
            })
            .with_item(Item {
                id: 5,
                item_type: "story".into(),
                by: None,
                url: None,
                score: None,
                title: Some(String::new()),
            })
            .with_story(6, "Sixth", Some(6));
        let stories = fetch_top_stories(&source, StoryType::Top, 30).unwrap();
        let ids: Vec<i64> = stories.iter().map(|story| story.id).collect();
        assert_eq!(ids, vec![1, 6]);
    }

    #[test]
    fn single_item_failure_does_not_abort_the_batch() {
        let source = MockStorySource::new(vec![1, 2, 3])
            .with_story(1, "One", Some(1))
            .with_story(3, "Three", Some(3));
        let stories = fetch_top_stories(&source, StoryType::Top, 30).unwrap();
        let titles: Vec<&str> = stories.iter().map(|story| story.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Three"]);
    }

    #[test]
    fn ranking_failure_aborts() {
        let err = fetch_top_stories(&MockStorySource::failing(), StoryType::Top, 30).unwrap_err();
        assert!(matches!(err, FetchError::Status { .. }));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn duplicate_ids_are_kept() {
        let source = MockStorySource::new(vec![7, 7]).with_story(7, "Twice", None);
        let stories = fetch_top_stories(&source, StoryType::Top, 30).unwrap();
        assert_eq!(stories.len(), 2);
    }
}
