use std::collections::VecDeque;

use super::host::{HostError, Placeholder, PlayerEmbed, PlayerSurface, TabActivator, TabTarget};
use super::model::{DetailTab, SeasonId};
use super::orchestrator::SessionEvent;

/// Host for one-shot commands: tabs switch immediately and report "shown"
/// through a queue the command drains.
#[derive(Debug, Default)]
pub(super) struct HeadlessHost {
    seasons: Vec<SeasonId>,
    queue: VecDeque<SessionEvent>,
    visible_season: Option<SeasonId>,
    detail_tab: Option<DetailTab>,
    player: Option<PlayerEmbed>,
    placeholder: Option<Placeholder>,
}

impl HeadlessHost {
    pub(super) fn new(seasons: Vec<SeasonId>) -> Self {
        let visible_season = seasons.first().cloned();
        Self {
            seasons,
            visible_season,
            ..Self::default()
        }
    }

    pub(super) fn take_event(&mut self) -> Option<SessionEvent> {
        self.queue.pop_front()
    }

    pub(super) fn visible_season(&self) -> Option<&SeasonId> {
        self.visible_season.as_ref()
    }

    pub(super) fn detail_tab(&self) -> Option<&DetailTab> {
        self.detail_tab.as_ref()
    }

    pub(super) fn player(&self) -> Option<&PlayerEmbed> {
        self.player.as_ref()
    }

    pub(super) fn placeholder(&self) -> Option<&Placeholder> {
        self.placeholder.as_ref()
    }
}

impl TabActivator for HeadlessHost {
    fn activate_tab(&mut self, tab: &TabTarget) -> Result<(), HostError> {
        match tab {
            TabTarget::Season(season) => {
                if !self.seasons.contains(season) {
                    return Err(HostError::UnknownTab(tab.to_string()));
                }
                self.visible_season = Some(season.clone());
            }
            TabTarget::Detail(detail) => {
                if detail.as_str() != DetailTab::WATCH && detail.as_str() != DetailTab::INFO {
                    return Err(HostError::UnknownTab(tab.to_string()));
                }
                self.detail_tab = Some(detail.clone());
            }
        }
        self.queue.push_back(SessionEvent::TabShown(tab.clone()));
        Ok(())
    }
}

impl PlayerSurface for HeadlessHost {
    fn mount_player(&mut self, embed: &PlayerEmbed) -> Result<(), HostError> {
        self.player = Some(embed.clone());
        self.placeholder = None;
        Ok(())
    }

    fn show_placeholder(&mut self, placeholder: Placeholder) {
        self.player = None;
        self.placeholder = Some(placeholder);
    }
}
