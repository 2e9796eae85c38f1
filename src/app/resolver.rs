use super::catalog::LinkCatalog;
use super::model::{SourceContext, SourceLink, TranslationId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Nothing playable in this context; render the empty state, do not load.
    NoSources,
    Resolved {
        sources: Vec<SourceLink>,
        selected: usize,
    },
}

impl Resolution {
    pub(crate) fn selected(&self) -> Option<&SourceLink> {
        match self {
            Self::NoSources => None,
            Self::Resolved { sources, selected } => sources.get(*selected),
        }
    }

    pub(crate) fn sources(&self) -> &[SourceLink] {
        match self {
            Self::NoSources => &[],
            Self::Resolved { sources, .. } => sources,
        }
    }
}

/// Orders the selectable sources for `context` and picks the one to auto-load.
///
/// Episode sources keep catalog order. Main-item sources are sorted by their
/// translation title (stable), the only context whose order is computed.
pub(crate) fn resolve_sources(
    catalog: &LinkCatalog,
    context: &SourceContext,
    preferred: Option<&TranslationId>,
) -> Resolution {
    let mut sources = match context {
        SourceContext::Main => catalog.main_links().to_vec(),
        SourceContext::Episode(episode) => catalog.episode_links(episode).to_vec(),
    };
    if sources.is_empty() {
        return Resolution::NoSources;
    }
    if matches!(context, SourceContext::Main) {
        sources.sort_by(|left, right| left.title.cmp(&right.title));
    }

    let selected = preferred
        .and_then(|wanted| {
            sources
                .iter()
                .position(|link| link.translation.as_ref() == Some(wanted))
        })
        .unwrap_or(0);

    Resolution::Resolved { sources, selected }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::app::model::{EpisodeId, SourceLinkId};

    fn link(id: &str, context: SourceContext, translation: Option<&str>, title: &str) -> SourceLink {
        SourceLink {
            id: SourceLinkId::new(id).expect("link id"),
            context,
            translation: translation.and_then(TranslationId::new),
            title: title.to_string(),
            quality: None,
            resume_at: None,
        }
    }

    fn catalog() -> (LinkCatalog, EpisodeId) {
        let episode = EpisodeId::new("7").expect("episode id");
        let ctx = SourceContext::Episode(episode.clone());
        let mut by_episode = HashMap::new();
        by_episode.insert(
            episode.clone(),
            vec![
                link("70", ctx.clone(), Some("3"), "Zeta Dub"),
                link("71", ctx.clone(), Some("610"), "Alpha Sub"),
                link("72", ctx, None, "Unknown"),
            ],
        );
        let main = vec![
            link("900", SourceContext::Main, Some("5"), "Studio Band"),
            link("901", SourceContext::Main, Some("6"), "AniMedia"),
            link("902", SourceContext::Main, Some("7"), "AniMedia"),
        ];
        (LinkCatalog::new(by_episode, main), episode)
    }

    #[test]
    fn episode_sources_keep_catalog_order_and_default_to_first() {
        let (catalog, episode) = catalog();
        let resolution = resolve_sources(&catalog, &SourceContext::Episode(episode), None);
        let ids: Vec<_> = resolution.sources().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["70", "71", "72"]);
        assert_eq!(resolution.selected().map(|l| l.id.as_str()), Some("70"));
    }

    #[test]
    fn preferred_translation_wins_regardless_of_numeric_form() {
        let (catalog, episode) = catalog();
        let preferred = TranslationId::new(" 610.0").expect("translation id");
        let resolution =
            resolve_sources(&catalog, &SourceContext::Episode(episode), Some(&preferred));
        assert_eq!(resolution.selected().map(|l| l.id.as_str()), Some("71"));
    }

    #[test]
    fn unknown_preference_falls_back_to_first_source() {
        let (catalog, episode) = catalog();
        let preferred = TranslationId::new("999").expect("translation id");
        let resolution =
            resolve_sources(&catalog, &SourceContext::Episode(episode), Some(&preferred));
        assert_eq!(resolution.selected().map(|l| l.id.as_str()), Some("70"));
    }

    #[test]
    fn main_sources_are_sorted_by_title_stably() {
        let (catalog, _) = catalog();
        let resolution = resolve_sources(&catalog, &SourceContext::Main, None);
        let ids: Vec<_> = resolution.sources().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["901", "902", "900"]);
        assert_eq!(resolution.selected().map(|l| l.id.as_str()), Some("901"));
    }

    #[test]
    fn empty_context_reports_no_sources() {
        let (catalog, _) = catalog();
        let missing = EpisodeId::new("404").expect("episode id");
        let resolution = resolve_sources(&catalog, &SourceContext::Episode(missing), None);
        assert_eq!(resolution, Resolution::NoSources);
        assert!(resolution.selected().is_none());

        let empty = LinkCatalog::default();
        assert_eq!(
            resolve_sources(&empty, &SourceContext::Main, None),
            Resolution::NoSources
        );
    }
}
