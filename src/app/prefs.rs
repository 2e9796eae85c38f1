use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;
use tracing::warn;

use super::model::{DetailTab, EpisodeId, LayoutMode, MediaId, TranslationId};

/// Durable preference keys. Every per-item key carries the item it belongs to,
/// so a write can never land in another item's scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum PrefKey {
    LastWatchedEpisode(MediaId),
    LastSelectedTranslation(MediaId),
    LastDetailTab(MediaId),
    Layout,
}

impl PrefKey {
    pub(crate) fn storage_key(&self) -> String {
        match self {
            Self::LastWatchedEpisode(media) => format!("last_watched_episode_{media}"),
            Self::LastSelectedTranslation(media) => format!("last_selected_translation_{media}"),
            Self::LastDetailTab(media) => format!("last_detail_tab_{media}"),
            Self::Layout => "player_layout_preference".to_string(),
        }
    }

    pub(crate) fn media_scoped(media: &MediaId) -> [PrefKey; 3] {
        [
            Self::LastWatchedEpisode(media.clone()),
            Self::LastSelectedTranslation(media.clone()),
            Self::LastDetailTab(media.clone()),
        ]
    }
}

pub(crate) trait PreferenceStore {
    fn load(&self, key: &PrefKey) -> Result<Option<String>>;
    fn store(&self, key: &PrefKey, value: &str) -> Result<()>;
    fn remove(&self, key: &PrefKey) -> Result<bool>;
}

/// Process-local store; clones share the same map.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryPreferenceStore {
    values: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryPreferenceStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn with(entries: &[(PrefKey, &str)]) -> Self {
        let store = Self::new();
        for (key, value) in entries {
            store
                .values
                .borrow_mut()
                .insert(key.storage_key(), (*value).to_string());
        }
        store
    }

    #[cfg(test)]
    pub(crate) fn get(&self, key: &PrefKey) -> Option<String> {
        self.values.borrow().get(&key.storage_key()).cloned()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.values.borrow().len()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, key: &PrefKey) -> Result<Option<String>> {
        Ok(self.values.borrow().get(&key.storage_key()).cloned())
    }

    fn store(&self, key: &PrefKey, value: &str) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(key.storage_key(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &PrefKey) -> Result<bool> {
        Ok(self.values.borrow_mut().remove(&key.storage_key()).is_some())
    }
}

/// Typed view of the store for one media item. Store failures are logged and
/// read as "nothing stored"; a broken store never interrupts playback.
pub(crate) struct Preferences {
    store: Box<dyn PreferenceStore>,
    media: MediaId,
}

impl Preferences {
    pub(crate) fn new(store: Box<dyn PreferenceStore>, media: MediaId) -> Self {
        Self { store, media }
    }

    pub(crate) fn last_episode(&self) -> Option<EpisodeId> {
        self.read(&PrefKey::LastWatchedEpisode(self.media.clone()))
            .and_then(|raw| EpisodeId::new(&raw))
    }

    pub(crate) fn remember_episode(&self, episode: &EpisodeId) {
        self.write(
            &PrefKey::LastWatchedEpisode(self.media.clone()),
            episode.as_str(),
        );
    }

    pub(crate) fn last_translation(&self) -> Option<TranslationId> {
        self.read(&PrefKey::LastSelectedTranslation(self.media.clone()))
            .and_then(|raw| TranslationId::new(&raw))
    }

    pub(crate) fn remember_translation(&self, translation: &TranslationId) {
        self.write(
            &PrefKey::LastSelectedTranslation(self.media.clone()),
            translation.as_str(),
        );
    }

    pub(crate) fn detail_tab(&self) -> Option<DetailTab> {
        self.read(&PrefKey::LastDetailTab(self.media.clone()))
            .and_then(|raw| DetailTab::new(&raw))
    }

    pub(crate) fn remember_detail_tab(&self, tab: &DetailTab) {
        self.write(&PrefKey::LastDetailTab(self.media.clone()), tab.as_str());
    }

    pub(crate) fn layout(&self) -> Option<LayoutMode> {
        let raw = self.read(&PrefKey::Layout)?;
        let parsed = LayoutMode::parse(&raw);
        if parsed.is_none() {
            warn!(value = %raw, "ignoring unknown stored layout preference");
        }
        parsed
    }

    pub(crate) fn remember_layout(&self, mode: LayoutMode) {
        self.write(&PrefKey::Layout, mode.as_str());
    }

    fn read(&self, key: &PrefKey) -> Option<String> {
        match self.store.load(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key.storage_key(), "failed to read preference: {err:#}");
                None
            }
        }
    }

    fn write(&self, key: &PrefKey, value: &str) {
        if let Err(err) = self.store.store(key, value) {
            warn!(key = %key.storage_key(), "failed to persist preference: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(raw: &str) -> MediaId {
        MediaId::new(raw).expect("media id")
    }

    #[test]
    fn storage_keys_match_the_host_layout() {
        let id = media("42");
        assert_eq!(
            PrefKey::LastWatchedEpisode(id.clone()).storage_key(),
            "last_watched_episode_42"
        );
        assert_eq!(
            PrefKey::LastSelectedTranslation(id.clone()).storage_key(),
            "last_selected_translation_42"
        );
        assert_eq!(
            PrefKey::LastDetailTab(id).storage_key(),
            "last_detail_tab_42"
        );
        assert_eq!(PrefKey::Layout.storage_key(), "player_layout_preference");
    }

    #[test]
    fn per_item_values_do_not_leak_between_items() {
        let store = MemoryPreferenceStore::new();
        let first = Preferences::new(Box::new(store.clone()), media("1"));
        let second = Preferences::new(Box::new(store.clone()), media("2"));

        first.remember_episode(&EpisodeId::new("101").expect("id"));
        first.remember_layout(LayoutMode::EpisodesRight);

        assert!(second.last_episode().is_none());
        assert_eq!(second.layout(), Some(LayoutMode::EpisodesRight));
        assert_eq!(first.last_episode().map(|e| e.to_string()), Some("101".to_string()));
    }

    #[test]
    fn unknown_layout_value_reads_as_unset() {
        let store = MemoryPreferenceStore::with(&[(PrefKey::Layout, "diagonal")]);
        let prefs = Preferences::new(Box::new(store), media("1"));
        assert_eq!(prefs.layout(), None);
    }

    #[test]
    fn store_failures_read_as_unset() {
        struct Broken;
        impl PreferenceStore for Broken {
            fn load(&self, _: &PrefKey) -> Result<Option<String>> {
                Err(anyhow::anyhow!("disk on fire"))
            }
            fn store(&self, _: &PrefKey, _: &str) -> Result<()> {
                Err(anyhow::anyhow!("disk on fire"))
            }
            fn remove(&self, _: &PrefKey) -> Result<bool> {
                Err(anyhow::anyhow!("disk on fire"))
            }
        }

        let prefs = Preferences::new(Box::new(Broken), media("1"));
        prefs.remember_translation(&TranslationId::new("3").expect("id"));
        assert!(prefs.last_translation().is_none());
    }
}
