//! Response cache for generation calls.
//!
//! The cache is an ordinary value: the host constructs it, hands it to a
//! [`CachingGenerator`], and calls `clear` or `set_skip` on it when the user
//! asks. Entries expire after [`MAX_AGE_MS`] and at most [`MAX_ENTRIES`] are
//! kept, oldest evicted first.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{GeneratedImage, GenerationResult, PanelBreakdown, StoryGenerator};
use crate::model::{PanelShape, TextBox};

pub const MAX_AGE_MS: u64 = 7 * 24 * 60 * 60 * 1000;
pub const MAX_ENTRIES: usize = 100;

/// Milliseconds since an arbitrary epoch.
pub type Clock = Box<dyn Fn() -> u64>;

#[derive(Debug, Clone)]
struct Entry {
    content: String,
    timestamp: u64,
}

pub struct ResponseCache {
    entries: HashMap<String, Entry>,
    skip: bool,
    clock: Clock,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    /// A cache timed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Box::new(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        }))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: HashMap::new(),
            skip: false,
            clock,
        }
    }

    /// Whitespace runs collapse, so prompts differing only in spacing share
    /// an entry.
    pub fn key(kind: &str, input: &str) -> String {
        let input = input.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("{kind}|||{input}")
    }

    pub fn get(&mut self, key: &str) -> Option<String> {
        if self.skip {
            return None;
        }
        let now = (self.clock)();
        let entry = self.entries.get(key)?;
        if now.saturating_sub(entry.timestamp) > MAX_AGE_MS {
            self.entries.remove(key);
            return None;
        }
        tracing::debug!(key, "cache hit");
        Some(entry.content.clone())
    }

    pub fn set(&mut self, key: String, content: String) {
        let timestamp = (self.clock)();
        self.entries.insert(key, Entry { content, timestamp });
        self.prune(timestamp);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        tracing::debug!("cleared response cache");
    }

    /// While skipping, lookups miss but fresh responses are still stored.
    pub fn set_skip(&mut self, skip: bool) {
        self.skip = skip;
    }

    pub fn is_skipping(&self) -> bool {
        self.skip
    }

    fn prune(&mut self, now: u64) {
        self.entries
            .retain(|_, e| now.saturating_sub(e.timestamp) <= MAX_AGE_MS);
        if self.entries.len() <= MAX_ENTRIES {
            return;
        }
        let mut by_age: Vec<(u64, String)> = self
            .entries
            .iter()
            .map(|(k, e)| (e.timestamp, k.clone()))
            .collect();
        by_age.sort();
        let excess = self.entries.len() - MAX_ENTRIES;
        for (_, key) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
    }
}

/// Any [`StoryGenerator`] with its replies memoised in a [`ResponseCache`].
pub struct CachingGenerator<G> {
    inner: G,
    cache: RefCell<ResponseCache>,
}

impl<G: StoryGenerator> CachingGenerator<G> {
    pub fn new(inner: G, cache: ResponseCache) -> Self {
        Self {
            inner,
            cache: RefCell::new(cache),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn set_skip_cache(&self, skip: bool) {
        self.cache.borrow_mut().set_skip(skip);
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }

    fn cached<T, F>(&self, kind: &str, input: &str, produce: F) -> GenerationResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&G) -> GenerationResult<T>,
    {
        let key = ResponseCache::key(kind, input);
        let hit = self.cache.borrow_mut().get(&key);
        if let Some(value) = hit.and_then(|c| serde_json::from_str(&c).ok()) {
            return Ok(value);
        }
        let value = produce(&self.inner)?;
        match serde_json::to_string(&value) {
            Ok(content) => self.cache.borrow_mut().set(key, content),
            Err(e) => tracing::warn!(kind, error = %e, "response not cacheable"),
        }
        Ok(value)
    }
}

impl<G: StoryGenerator> StoryGenerator for CachingGenerator<G> {
    fn generate_story_outline(&self, prompt: &str) -> GenerationResult<String> {
        self.cached("outline", prompt, |g| g.generate_story_outline(prompt))
    }

    fn generate_comic_panels(&self, story: &str) -> GenerationResult<PanelBreakdown> {
        self.cached("panels", story, |g| g.generate_comic_panels(story))
    }

    fn generate_speech_for_panel(&self, image_prompt: &str) -> GenerationResult<Vec<TextBox>> {
        self.cached("speech", image_prompt, |g| g.generate_speech_for_panel(image_prompt))
    }

    fn generate_image(&self, prompt: &str, shape: PanelShape) -> GenerationResult<GeneratedImage> {
        let kind = match shape {
            PanelShape::Square => "image:square",
            PanelShape::Portrait => "image:portrait",
            PanelShape::Landscape => "image:landscape",
        };
        self.cached(kind, prompt, |g| g.generate_image(prompt, shape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::tests::ScriptedGenerator;
    use std::cell::Cell;
    use std::rc::Rc;

    fn manual_clock() -> (Rc<Cell<u64>>, ResponseCache) {
        let now = Rc::new(Cell::new(1_000));
        let handle = Rc::clone(&now);
        (now, ResponseCache::with_clock(Box::new(move || handle.get())))
    }

    #[test]
    fn test_key_collapses_whitespace() {
        assert_eq!(
            ResponseCache::key("outline", "  a\n  dragon\tstory "),
            ResponseCache::key("outline", "a dragon story")
        );
        assert_ne!(ResponseCache::key("outline", "a"), ResponseCache::key("speech", "a"));
    }

    #[test]
    fn test_entries_expire_after_seven_days() {
        let (now, mut cache) = manual_clock();
        cache.set("k".into(), "v".into());
        now.set(1_000 + MAX_AGE_MS);
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        now.set(1_000 + MAX_AGE_MS + 1);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_oldest_entries_evicted_past_capacity() {
        let (now, mut cache) = manual_clock();
        for i in 0..(MAX_ENTRIES as u64 + 5) {
            now.set(1_000 + i);
            cache.set(format!("k{i}"), i.to_string());
        }
        assert_eq!(cache.len(), MAX_ENTRIES);
        assert_eq!(cache.get("k0"), None);
        assert_eq!(cache.get("k4"), None);
        assert_eq!(cache.get("k5").as_deref(), Some("5"));
    }

    #[test]
    fn test_skip_misses_but_still_stores() {
        let (_, mut cache) = manual_clock();
        cache.set_skip(true);
        cache.set("k".into(), "v".into());
        assert_eq!(cache.get("k"), None);
        cache.set_skip(false);
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        cache.clear();
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_caching_generator_memoises_calls() {
        let (_, cache) = manual_clock();
        let generator = CachingGenerator::new(ScriptedGenerator::default(), cache);

        let first = generator.generate_story_outline("a lighthouse").unwrap();
        let second = generator.generate_story_outline("a  lighthouse").unwrap();
        assert_eq!(first, second);
        assert_eq!(generator.inner().calls.get(), 1);

        generator.generate_comic_panels("One. Two.").unwrap();
        let panels = generator.generate_comic_panels("One. Two.").unwrap();
        assert_eq!(panels.panels.len(), 2);
        assert_eq!(generator.inner().calls.get(), 2);

        generator.generate_image("boat", PanelShape::Square).unwrap();
        generator.generate_image("boat", PanelShape::Portrait).unwrap();
        assert_eq!(generator.inner().calls.get(), 4);
        assert_eq!(generator.cached_entries(), 4);
    }

    #[test]
    fn test_caching_generator_skip_and_clear() {
        let (_, cache) = manual_clock();
        let generator = CachingGenerator::new(ScriptedGenerator::default(), cache);
        generator.generate_speech_for_panel("hi").unwrap();

        generator.set_skip_cache(true);
        generator.generate_speech_for_panel("hi").unwrap();
        assert_eq!(generator.inner().calls.get(), 2);

        generator.set_skip_cache(false);
        generator.clear_cache();
        generator.generate_speech_for_panel("hi").unwrap();
        assert_eq!(generator.inner().calls.get(), 3);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let (_, cache) = manual_clock();
        let generator = CachingGenerator::new(
            ScriptedGenerator {
                fail_images: true,
                ..Default::default()
            },
            cache,
        );
        assert!(generator.generate_image("x", PanelShape::Square).is_err());
        assert!(generator.generate_image("x", PanelShape::Square).is_err());
        assert_eq!(generator.inner().calls.get(), 2);
        assert_eq!(generator.cached_entries(), 0);
    }
}
