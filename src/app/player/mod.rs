mod tracker;
mod url;

use thiserror::Error;
use tracing::{debug, info, warn};

pub(crate) use tracker::*;
pub(crate) use url::PlayUrlTemplate;

use super::host::{HostError, Placeholder, PlayerEmbed, PlayerSurface};
use super::model::{EpisodeId, LayoutMode, SourceLink, SourceLinkId, TranslationId};
use super::prefs::Preferences;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum PlayerError {
    #[error("no playback URL template configured")]
    MissingTemplate,
    #[error("playback URL template has no numeric path segment: {0}")]
    TemplateWithoutSlot(String),
    #[error("playback URL template has more than one numeric path segment: {0}")]
    AmbiguousTemplate(String),
    #[error("source link id cannot be placed in a URL path: {0}")]
    InvalidLinkId(String),
    #[error(transparent)]
    Surface(#[from] HostError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadRequest {
    pub(crate) link: SourceLinkId,
    pub(crate) translation: Option<TranslationId>,
    pub(crate) resume_at: Option<u32>,
}

impl LoadRequest {
    pub(crate) fn for_link(link: &SourceLink) -> Self {
        Self {
            link: link.id.clone(),
            translation: link.translation.clone(),
            resume_at: link.resume_at,
        }
    }
}

pub(crate) struct PlayerLoader {
    template: Result<PlayUrlTemplate, PlayerError>,
    tracking: TrackingConfig,
    tracker: Box<dyn WatchTracker>,
}

impl PlayerLoader {
    pub(crate) fn new(
        template: Option<&str>,
        tracking: TrackingConfig,
        tracker: Box<dyn WatchTracker>,
    ) -> Self {
        let template = match template {
            Some(raw) => PlayUrlTemplate::parse(raw),
            None => Err(PlayerError::MissingTemplate),
        };
        if let Err(err) = &template {
            warn!("playback will be unavailable: {err}");
        }
        Self {
            template,
            tracking,
            tracker,
        }
    }

    /// Renders the player for `request`, then records bookmarks and history.
    ///
    /// The episode bookmark is written only outside the player-only layout, so
    /// playing the main item never overwrites (or clears) it. On failure an
    /// error placeholder is shown and nothing is persisted.
    pub(crate) fn load(
        &self,
        request: &LoadRequest,
        mode: LayoutMode,
        current_episode: Option<&EpisodeId>,
        prefs: &Preferences,
        surface: &mut dyn PlayerSurface,
    ) -> Result<PlayerEmbed, PlayerError> {
        let embed = match self.render(request, surface) {
            Ok(embed) => embed,
            Err(err) => {
                warn!(link = %request.link, "player load failed: {err}");
                surface.show_placeholder(Placeholder::Error(format!("Player unavailable: {err}")));
                return Err(err);
            }
        };
        info!(link = %request.link, url = %embed.url, "player loaded");

        if let Some(translation) = &request.translation {
            prefs.remember_translation(translation);
        }
        if mode != LayoutMode::PlayerOnly
            && let Some(episode) = current_episode
        {
            prefs.remember_episode(episode);
        }

        match self.tracking.event_for(&request.link) {
            Ok(event) => self.tracker.record(event),
            Err(reason) => debug!(link = %request.link, "watch history skipped: {reason}"),
        }
        Ok(embed)
    }

    pub(crate) fn drain(&self) {
        self.tracker.drain();
    }

    fn render(
        &self,
        request: &LoadRequest,
        surface: &mut dyn PlayerSurface,
    ) -> Result<PlayerEmbed, PlayerError> {
        let template = self.template.as_ref().map_err(Clone::clone)?;
        let url = template.build(&request.link, request.resume_at)?;
        let embed = PlayerEmbed {
            link: request.link.clone(),
            url,
        };
        surface.mount_player(&embed)?;
        Ok(embed)
    }
}
