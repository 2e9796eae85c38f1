use std::sync::mpsc::Sender;

use super::super::host::{
    HostError, Placeholder, PlayerEmbed, PlayerSurface, TabActivator, TabTarget,
};
use super::super::model::{DetailTab, SeasonId};
use super::super::orchestrator::{PROMPT_SELECT_EPISODE, SessionEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum PlayerPane {
    Placeholder(Placeholder),
    Playing(PlayerEmbed),
}

/// Terminal rendition of the host page. Tab switches take effect on the next
/// frame; the "shown" notification travels back through the event channel.
pub(super) struct TuiHost {
    seasons: Vec<SeasonId>,
    visible_season: Option<SeasonId>,
    detail_tab: DetailTab,
    pane: PlayerPane,
    shown_tx: Sender<SessionEvent>,
}

impl TuiHost {
    pub(super) fn new(seasons: Vec<SeasonId>, shown_tx: Sender<SessionEvent>) -> Self {
        let visible_season = seasons.first().cloned();
        Self {
            seasons,
            visible_season,
            detail_tab: DetailTab::watch(),
            pane: PlayerPane::Placeholder(Placeholder::Prompt(PROMPT_SELECT_EPISODE.to_string())),
            shown_tx,
        }
    }

    pub(super) fn visible_season(&self) -> Option<&SeasonId> {
        self.visible_season.as_ref()
    }

    pub(super) fn detail_tab(&self) -> &DetailTab {
        &self.detail_tab
    }

    pub(super) fn pane(&self) -> &PlayerPane {
        &self.pane
    }
}

impl TabActivator for TuiHost {
    fn activate_tab(&mut self, tab: &TabTarget) -> Result<(), HostError> {
        match tab {
            TabTarget::Season(season) => {
                if !self.seasons.contains(season) {
                    return Err(HostError::UnknownTab(tab.to_string()));
                }
                self.visible_season = Some(season.clone());
            }
            TabTarget::Detail(detail) => match detail.as_str() {
                DetailTab::WATCH | DetailTab::INFO => self.detail_tab = detail.clone(),
                _ => return Err(HostError::UnknownTab(tab.to_string())),
            },
        }
        self.shown_tx
            .send(SessionEvent::TabShown(tab.clone()))
            .map_err(|_| HostError::Other("event loop is no longer running".to_string()))
    }
}

impl PlayerSurface for TuiHost {
    fn mount_player(&mut self, embed: &PlayerEmbed) -> Result<(), HostError> {
        self.pane = PlayerPane::Playing(embed.clone());
        Ok(())
    }

    fn show_placeholder(&mut self, placeholder: Placeholder) {
        self.pane = PlayerPane::Placeholder(placeholder);
    }
}
