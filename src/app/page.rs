use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use super::catalog::{LinkCatalog, read_catalog};
use super::model::{Episode, EpisodeId, MediaId, Season, SeasonId, Slot};
use super::navigator::EpisodeGrid;
use super::player::TrackingConfig;

/// Everything the host page hands the session at bootstrap.
#[derive(Debug, Clone)]
pub(crate) struct HostPage {
    pub(crate) media: MediaId,
    pub(crate) title: String,
    pub(crate) grid: EpisodeGrid,
    pub(crate) catalog: LinkCatalog,
    pub(crate) catalog_warnings: Vec<String>,
    pub(crate) play_url_template: Option<String>,
    pub(crate) tracking: TrackingConfig,
}

impl HostPage {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read page document {}", path.display()))?;
        let mut page = Self::parse(&raw)
            .with_context(|| format!("invalid page document {}", path.display()))?;
        page.tracking = apply_tracking_env_overrides(
            page.tracking,
            env::var_os("PLAYSESSION_TRACK_ENDPOINT"),
            env::var_os("PLAYSESSION_CSRF_TOKEN"),
        );
        Ok(page)
    }

    pub(crate) fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).context("page document is not valid JSON")?;
        let media = value.get("media").unwrap_or(&Value::Null);
        let media_id = media
            .get("id")
            .and_then(MediaId::from_value)
            .ok_or_else(|| anyhow!("page document is missing media.id"))?;
        let title = text_field(media, "title").unwrap_or_else(|| format!("Item {media_id}"));

        let grid = parse_grid(value.get("seasons"));
        let catalog_read = read_catalog(value.get("episode_links"), value.get("main_links"));

        let play_url_template = text_field(&value, "play_url_template").map(|template| {
            match text_field(&value, "site_url") {
                Some(site) if template.starts_with('/') => {
                    format!("{}{template}", site.trim_end_matches('/'))
                }
                _ => template,
            }
        });

        let tracking = TrackingConfig {
            endpoint: text_field(&value, "track_endpoint"),
            csrf_token: text_field(&value, "csrf_token"),
            authenticated: value
                .get("authenticated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        };

        Ok(Self {
            media: media_id,
            title,
            grid,
            catalog: catalog_read.catalog,
            catalog_warnings: catalog_read.warnings,
            play_url_template,
            tracking,
        })
    }
}

pub(crate) fn apply_tracking_env_overrides(
    mut tracking: TrackingConfig,
    endpoint: Option<OsString>,
    csrf_token: Option<OsString>,
) -> TrackingConfig {
    if let Some(value) = endpoint.filter(|value| !value.is_empty()) {
        tracking.endpoint = Some(value.to_string_lossy().into_owned());
    }
    if let Some(value) = csrf_token.filter(|value| !value.is_empty()) {
        tracking.csrf_token = Some(value.to_string_lossy().into_owned());
    }
    tracking
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    let text = value.get(key)?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn parse_grid(seasons: Option<&Value>) -> EpisodeGrid {
    let Some(items) = seasons.and_then(Value::as_array) else {
        return EpisodeGrid::default();
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let number = item
            .get("number")
            .and_then(Value::as_i64)
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(idx as i32 + 1);
        let Some(id) = item
            .get("id")
            .and_then(SeasonId::from_value)
            .or_else(|| SeasonId::new(&number.to_string()))
        else {
            continue;
        };

        let slots = item
            .get("episodes")
            .and_then(Value::as_array)
            .map(|episodes| {
                episodes
                    .iter()
                    .enumerate()
                    .map(|(position, entry)| parse_slot(entry, position, &id))
                    .collect()
            })
            .unwrap_or_default();

        out.push(Season {
            id,
            number,
            title: text_field(item, "title"),
            slots,
        });
    }
    EpisodeGrid::new(out)
}

fn parse_slot(entry: &Value, position: usize, season: &SeasonId) -> Slot {
    let Some(id) = entry.get("id").and_then(EpisodeId::from_value) else {
        return Slot::Spacer;
    };
    let number = entry
        .get("number")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(position as u32 + 1);
    Slot::Episode(Episode {
        id,
        number,
        season: season.clone(),
        title: text_field(entry, "title"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "media": {"id": 42, "title": "Frieren"},
        "site_url": "https://site.test/",
        "play_url_template": "/ru/play/0/",
        "track_endpoint": "https://site.test/ru/track_watch/",
        "csrf_token": "tok",
        "authenticated": true,
        "seasons": [
            {"id": 1, "number": 1, "episodes": [{"id": 101, "number": 1}, null, {"id": 102}]},
            {"id": 2, "number": 0, "title": "Movie", "episodes": []}
        ],
        "episode_links": "{\"101\": [{\"id\": 5001, \"translation_id\": 610, \"translation_title\": \"AniLibria\"}]}",
        "main_links": {}
    }"#;

    #[test]
    fn parses_a_complete_page() {
        let page = HostPage::parse(PAGE).expect("page should parse");
        assert_eq!(page.media.to_string(), "42");
        assert_eq!(page.title, "Frieren");
        assert_eq!(
            page.play_url_template.as_deref(),
            Some("https://site.test/ru/play/0/")
        );
        assert!(page.tracking.authenticated);
        assert_eq!(page.grid.seasons().len(), 2);
        assert_eq!(page.grid.episode_count(), 2);

        let first = &page.grid.seasons()[0];
        assert_eq!(first.slots[1], Slot::Spacer);
        assert_eq!(first.slots[2].episode().map(|e| e.number), Some(3));
        assert_eq!(page.grid.seasons()[1].label(), "Movie");

        let episode = EpisodeId::new("101").expect("id");
        assert_eq!(page.catalog.episode_links(&episode).len(), 1);
        assert!(page.catalog_warnings.is_empty());
    }

    #[test]
    fn broken_catalogs_do_not_fail_the_page() {
        let raw = r#"{"media": {"id": "7"}, "episode_links": "{oops", "main_links": 5}"#;
        let page = HostPage::parse(raw).expect("page should still parse");
        assert_eq!(page.title, "Item 7");
        assert_eq!(page.catalog.episode_count(), 0);
        assert_eq!(page.catalog_warnings.len(), 2);
        assert!(!page.tracking.authenticated);
        assert!(page.play_url_template.is_none());
    }

    #[test]
    fn missing_media_id_is_an_error() {
        let err = HostPage::parse(r#"{"media": {}}"#).expect_err("missing id");
        assert!(err.to_string().contains("media.id"));
    }

    #[test]
    fn env_overrides_replace_tracking_settings() {
        let tracking = TrackingConfig {
            endpoint: Some("https://a.test/".to_string()),
            csrf_token: None,
            authenticated: true,
        };
        let updated = apply_tracking_env_overrides(
            tracking.clone(),
            Some(OsString::from("https://b.test/track/")),
            Some(OsString::from("secret")),
        );
        assert_eq!(updated.endpoint.as_deref(), Some("https://b.test/track/"));
        assert_eq!(updated.csrf_token.as_deref(), Some("secret"));

        let untouched = apply_tracking_env_overrides(tracking.clone(), Some(OsString::new()), None);
        assert_eq!(untouched, tracking);
    }
}
