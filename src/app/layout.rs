use thiserror::Error;

use super::model::LayoutMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EpisodePlacement {
    Below,
    Right,
    Hidden,
}

/// Presentation parameters for one layout. The host decides how to draw them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LayoutParams {
    /// Share of the main area given to the player, in percent.
    pub(crate) player_share: u16,
    pub(crate) episodes: EpisodePlacement,
    pub(crate) independent_scroll: bool,
    /// List-style rows instead of the grid.
    pub(crate) compact_entries: bool,
}

impl LayoutMode {
    pub(crate) fn params(self) -> LayoutParams {
        match self {
            Self::EpisodesBelow => LayoutParams {
                player_share: 60,
                episodes: EpisodePlacement::Below,
                independent_scroll: false,
                compact_entries: false,
            },
            Self::EpisodesRight => LayoutParams {
                player_share: 70,
                episodes: EpisodePlacement::Right,
                independent_scroll: true,
                compact_entries: true,
            },
            Self::PlayerOnly => LayoutParams {
                player_share: 100,
                episodes: EpisodePlacement::Hidden,
                independent_scroll: false,
                compact_entries: false,
            },
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LayoutError {
    #[error("layout {0} is unavailable: this item has no main sources")]
    Unavailable(LayoutMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LayoutTransition {
    pub(crate) from: LayoutMode,
    pub(crate) to: LayoutMode,
}

impl LayoutTransition {
    pub(crate) fn enters_player_only(self) -> bool {
        self.to == LayoutMode::PlayerOnly && self.from != LayoutMode::PlayerOnly
    }

    pub(crate) fn leaves_player_only(self) -> bool {
        self.from == LayoutMode::PlayerOnly && self.to != LayoutMode::PlayerOnly
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LayoutController {
    mode: LayoutMode,
    player_only_available: bool,
}

impl LayoutController {
    pub(crate) fn new(main_sources_available: bool) -> Self {
        Self {
            mode: LayoutMode::default(),
            player_only_available: main_sources_available,
        }
    }

    pub(crate) fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub(crate) fn params(&self) -> LayoutParams {
        self.mode.params()
    }

    pub(crate) fn is_selectable(&self, mode: LayoutMode) -> bool {
        mode != LayoutMode::PlayerOnly || self.player_only_available
    }

    /// Next/previous controls only make sense while an episode list is shown.
    pub(crate) fn nav_enabled(&self) -> bool {
        self.mode != LayoutMode::PlayerOnly
    }

    pub(crate) fn options(&self) -> [(LayoutMode, bool); 3] {
        LayoutMode::ALL.map(|mode| (mode, self.is_selectable(mode)))
    }

    /// Layout to start with: the stored preference when it can be honoured,
    /// the default otherwise.
    pub(crate) fn initial_mode(&self, stored: Option<LayoutMode>) -> LayoutMode {
        match stored {
            Some(mode) if self.is_selectable(mode) => mode,
            _ => LayoutMode::default(),
        }
    }

    /// Commits `mode`. `Ok(None)` when it is already active.
    pub(crate) fn request(&mut self, mode: LayoutMode) -> Result<Option<LayoutTransition>, LayoutError> {
        if !self.is_selectable(mode) {
            return Err(LayoutError::Unavailable(mode));
        }
        if mode == self.mode {
            return Ok(None);
        }
        let transition = LayoutTransition {
            from: self.mode,
            to: mode,
        };
        self.mode = mode;
        Ok(Some(transition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_episodes_below() {
        let controller = LayoutController::new(true);
        assert_eq!(controller.mode(), LayoutMode::EpisodesBelow);
        assert!(controller.nav_enabled());
    }

    #[test]
    fn player_only_is_refused_without_main_sources() {
        let mut controller = LayoutController::new(false);
        assert_eq!(
            controller.request(LayoutMode::PlayerOnly),
            Err(LayoutError::Unavailable(LayoutMode::PlayerOnly))
        );
        assert_eq!(controller.mode(), LayoutMode::EpisodesBelow);
        assert_eq!(
            controller.initial_mode(Some(LayoutMode::PlayerOnly)),
            LayoutMode::EpisodesBelow
        );
        assert_eq!(
            controller.options()[2],
            (LayoutMode::PlayerOnly, false)
        );
    }

    #[test]
    fn stored_mode_is_used_when_selectable() {
        let controller = LayoutController::new(true);
        assert_eq!(
            controller.initial_mode(Some(LayoutMode::PlayerOnly)),
            LayoutMode::PlayerOnly
        );
        assert_eq!(controller.initial_mode(None), LayoutMode::EpisodesBelow);
    }

    #[test]
    fn transitions_report_player_only_edges() {
        let mut controller = LayoutController::new(true);
        let into = controller
            .request(LayoutMode::PlayerOnly)
            .expect("allowed")
            .expect("changed");
        assert!(into.enters_player_only());
        assert!(!controller.nav_enabled());

        let out = controller
            .request(LayoutMode::EpisodesRight)
            .expect("allowed")
            .expect("changed");
        assert!(out.leaves_player_only());
        assert!(!out.enters_player_only());

        assert_eq!(controller.request(LayoutMode::EpisodesRight), Ok(None));
    }

    #[test]
    fn episodes_right_exposes_compact_scrolling_hints() {
        let params = LayoutMode::EpisodesRight.params();
        assert!(params.independent_scroll);
        assert!(params.compact_entries);
        assert_eq!(LayoutMode::PlayerOnly.params().episodes, EpisodePlacement::Hidden);
    }
}
