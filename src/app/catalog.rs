use std::collections::HashMap;

use serde_json::{Map, Value};

use super::model::{EpisodeId, SourceContext, SourceLink, SourceLinkId, TranslationId};

/// Source links for one media item, split by the context they play in.
#[derive(Debug, Clone, Default)]
pub(crate) struct LinkCatalog {
    by_episode: HashMap<EpisodeId, Vec<SourceLink>>,
    main: Vec<SourceLink>,
}

impl LinkCatalog {
    #[cfg(test)]
    pub(crate) fn new(by_episode: HashMap<EpisodeId, Vec<SourceLink>>, main: Vec<SourceLink>) -> Self {
        Self { by_episode, main }
    }

    pub(crate) fn episode_links(&self, episode: &EpisodeId) -> &[SourceLink] {
        self.by_episode
            .get(episode)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn main_links(&self) -> &[SourceLink] {
        &self.main
    }

    pub(crate) fn has_main_links(&self) -> bool {
        !self.main.is_empty()
    }

    pub(crate) fn episode_count(&self) -> usize {
        self.by_episode.len()
    }
}

#[derive(Debug, Default)]
pub(crate) struct CatalogRead {
    pub(crate) catalog: LinkCatalog,
    pub(crate) warnings: Vec<String>,
}

/// Builds the catalog from the two host documents. Either document may be an
/// inline object or a JSON-encoded string; anything unusable degrades to empty.
pub(crate) fn read_catalog(episode_doc: Option<&Value>, main_doc: Option<&Value>) -> CatalogRead {
    let mut warnings = Vec::new();

    let by_episode = match embedded_object(episode_doc, "episode links", &mut warnings) {
        Some(object) => parse_episode_links(&object, &mut warnings),
        None => HashMap::new(),
    };
    let main = match embedded_object(main_doc, "main links", &mut warnings) {
        Some(object) => parse_main_links(&object, &mut warnings),
        None => Vec::new(),
    };

    CatalogRead {
        catalog: LinkCatalog { by_episode, main },
        warnings,
    }
}

fn embedded_object(
    doc: Option<&Value>,
    label: &str,
    warnings: &mut Vec<String>,
) -> Option<Map<String, Value>> {
    let doc = doc?;
    let parsed = match doc {
        Value::Null => return None,
        Value::String(raw) if raw.trim().is_empty() => return None,
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(err) => {
                warnings.push(format!("{label}: malformed JSON ({err}); using empty catalog"));
                return None;
            }
        },
        other => other.clone(),
    };
    match parsed {
        Value::Object(object) => Some(object),
        _ => {
            warnings.push(format!("{label}: expected a JSON object; using empty catalog"));
            None
        }
    }
}

fn parse_episode_links(
    object: &Map<String, Value>,
    warnings: &mut Vec<String>,
) -> HashMap<EpisodeId, Vec<SourceLink>> {
    let mut out = HashMap::new();
    let mut skipped = 0;
    for (key, value) in object {
        let Some(episode) = EpisodeId::new(key) else {
            skipped += 1;
            continue;
        };
        let Some(items) = value.as_array() else {
            skipped += 1;
            continue;
        };
        let context = SourceContext::Episode(episode.clone());
        let mut links = Vec::with_capacity(items.len());
        for item in items {
            match parse_link(item, None, &context) {
                Some(link) => links.push(link),
                None => skipped += 1,
            }
        }
        out.insert(episode, links);
    }
    if skipped > 0 {
        warnings.push(format!("episode links: ignored {skipped} malformed entr(y/ies)"));
    }
    out
}

fn parse_main_links(object: &Map<String, Value>, warnings: &mut Vec<String>) -> Vec<SourceLink> {
    let mut out = Vec::with_capacity(object.len());
    let mut skipped = 0;
    for (key, value) in object {
        match parse_link(value, Some(key), &SourceContext::Main) {
            Some(link) => out.push(link),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warnings.push(format!("main links: ignored {skipped} malformed entr(y/ies)"));
    }
    out
}

fn parse_link(value: &Value, fallback_id: Option<&str>, context: &SourceContext) -> Option<SourceLink> {
    let object = value.as_object()?;
    let id = object
        .get("id")
        .and_then(SourceLinkId::from_value)
        .or_else(|| fallback_id.and_then(SourceLinkId::new))?;
    let translation = object
        .get("translation_id")
        .and_then(TranslationId::from_value);
    let title = first_text(object, &["translation_title", "title"])
        .unwrap_or_else(|| format!("Source {id}"));
    let quality = first_text(object, &["quality", "quality_info"]);
    let resume_at = object
        .get("resume_at")
        .or_else(|| object.get("start_from"))
        .and_then(parse_seconds);

    Some(SourceLink {
        id,
        context: context.clone(),
        translation,
        title,
        quality,
        resume_at,
    })
}

fn first_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let text = object.get(*key)?.as_str()?.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

fn parse_seconds(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ep(raw: &str) -> EpisodeId {
        EpisodeId::new(raw).expect("episode id")
    }

    #[test]
    fn reads_inline_objects_in_catalog_order() {
        let episodes = json!({
            "101": [
                {"id": 5001, "translation_id": 610, "translation_title": "AniLibria", "quality": "720p"},
                {"id": "5002", "translation_id": "609", "translation_title": "AniDUB", "resume_at": 95}
            ]
        });
        let read = read_catalog(Some(&episodes), None);
        assert!(read.warnings.is_empty(), "{:?}", read.warnings);

        let links = read.catalog.episode_links(&ep("101"));
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].id.as_str(), "5001");
        assert_eq!(links[0].quality.as_deref(), Some("720p"));
        assert_eq!(links[1].translation.as_ref().map(|t| t.as_str()), Some("609"));
        assert_eq!(links[1].resume_at, Some(95));
        assert_eq!(links[1].context, SourceContext::Episode(ep("101")));
        assert!(!read.catalog.has_main_links());
    }

    #[test]
    fn reads_json_encoded_documents_and_main_ids_from_keys() {
        let main = Value::String(r#"{"9001": {"translation_id": 1, "title": "Original"}}"#.to_string());
        let read = read_catalog(None, Some(&main));
        let links = read.catalog.main_links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].id.as_str(), "9001");
        assert_eq!(links[0].title, "Original");
        assert_eq!(links[0].context, SourceContext::Main);
    }

    #[test]
    fn main_links_keep_document_order() {
        let main = Value::String(
            r#"{"9": {"title": "AniMedia"}, "10": {"title": "AniMedia"}, "2": {"title": "Kodik"}}"#
                .to_string(),
        );
        let read = read_catalog(None, Some(&main));
        let ids: Vec<_> = read.catalog.main_links().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "10", "2"]);
    }

    #[test]
    fn malformed_documents_degrade_to_empty_catalog() {
        let broken = Value::String("{not json".to_string());
        let wrong_shape = json!([1, 2, 3]);
        let read = read_catalog(Some(&broken), Some(&wrong_shape));
        assert_eq!(read.catalog.episode_count(), 0);
        assert!(!read.catalog.has_main_links());
        assert_eq!(read.warnings.len(), 2);
    }

    #[test]
    fn links_without_an_id_are_skipped_with_a_warning() {
        let episodes = json!({"7": [{"translation_id": 3}, {"id": 70}], "8": "nope"});
        let read = read_catalog(Some(&episodes), None);
        assert_eq!(read.catalog.episode_links(&ep("7")).len(), 1);
        assert!(read.catalog.episode_links(&ep("8")).is_empty());
        assert_eq!(read.warnings.len(), 1);
        assert!(read.warnings[0].contains("ignored 2"));
    }
}
