use tracing::warn;

use super::host::{TabActivator, TabTarget};
use super::model::{Episode, EpisodeId, Season, SeasonId};

/// Season panes in display order, each a row-major run of slots.
#[derive(Debug, Clone, Default)]
pub(crate) struct EpisodeGrid {
    seasons: Vec<Season>,
}

impl EpisodeGrid {
    pub(crate) fn new(seasons: Vec<Season>) -> Self {
        Self { seasons }
    }

    pub(crate) fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    pub(crate) fn season(&self, id: &SeasonId) -> Option<&Season> {
        self.seasons.iter().find(|season| &season.id == id)
    }

    pub(crate) fn first_season(&self) -> Option<&Season> {
        self.seasons.first()
    }

    pub(crate) fn episode(&self, id: &EpisodeId) -> Option<&Episode> {
        let (season_idx, slot_idx) = self.locate(id)?;
        self.seasons[season_idx].slots[slot_idx].episode()
    }

    pub(crate) fn episode_count(&self) -> usize {
        self.seasons.iter().map(|season| season.episodes().count()).sum()
    }

    fn locate(&self, id: &EpisodeId) -> Option<(usize, usize)> {
        self.seasons
            .iter()
            .enumerate()
            .find_map(|(season_idx, season)| {
                season
                    .slots
                    .iter()
                    .position(|slot| slot.episode().is_some_and(|episode| &episode.id == id))
                    .map(|slot_idx| (season_idx, slot_idx))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Next,
    Previous,
}

impl Direction {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "previous",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeasonSwitch {
    pub(crate) season: SeasonId,
    /// Activation was requested and accepted; the episode should be selected
    /// once the host reports the season as shown.
    pub(crate) awaiting_shown: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NavTarget {
    pub(crate) episode: EpisodeId,
    pub(crate) season_switch: Option<SeasonSwitch>,
}

enum Step<'a> {
    Sibling(&'a Episode),
    Crossing(&'a Season, &'a Episode),
}

pub(crate) struct Navigator<'a> {
    grid: &'a EpisodeGrid,
}

impl<'a> Navigator<'a> {
    pub(crate) fn new(grid: &'a EpisodeGrid) -> Self {
        Self { grid }
    }

    pub(crate) fn next(
        &self,
        current: Option<&EpisodeId>,
        tabs: &mut dyn TabActivator,
    ) -> Option<NavTarget> {
        self.navigate(current, Direction::Next, tabs)
    }

    pub(crate) fn prev(
        &self,
        current: Option<&EpisodeId>,
        tabs: &mut dyn TabActivator,
    ) -> Option<NavTarget> {
        self.navigate(current, Direction::Previous, tabs)
    }

    /// Neighbour lookup without touching the tab framework; drives button state.
    pub(crate) fn peek(&self, current: Option<&EpisodeId>, direction: Direction) -> Option<&'a Episode> {
        match self.step(current?, direction)? {
            Step::Sibling(episode) | Step::Crossing(_, episode) => Some(episode),
        }
    }

    fn navigate(
        &self,
        current: Option<&EpisodeId>,
        direction: Direction,
        tabs: &mut dyn TabActivator,
    ) -> Option<NavTarget> {
        match self.step(current?, direction)? {
            Step::Sibling(episode) => Some(NavTarget {
                episode: episode.id.clone(),
                season_switch: None,
            }),
            Step::Crossing(season, episode) => {
                let target = TabTarget::Season(season.id.clone());
                let awaiting_shown = match tabs.activate_tab(&target) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(tab = %target, "season tab activation failed: {err}");
                        false
                    }
                };
                Some(NavTarget {
                    episode: episode.id.clone(),
                    season_switch: Some(SeasonSwitch {
                        season: season.id.clone(),
                        awaiting_shown,
                    }),
                })
            }
        }
    }

    fn step(&self, current: &EpisodeId, direction: Direction) -> Option<Step<'a>> {
        let Some((season_idx, slot_idx)) = self.grid.locate(current) else {
            warn!(episode = %current, "current episode has no slot in the grid");
            return None;
        };
        let seasons = self.grid.seasons();
        let slots = &seasons[season_idx].slots;

        let sibling = match direction {
            Direction::Next => slots[slot_idx + 1..].iter().find_map(|slot| slot.episode()),
            Direction::Previous => slots[..slot_idx].iter().rev().find_map(|slot| slot.episode()),
        };
        if let Some(episode) = sibling {
            return Some(Step::Sibling(episode));
        }

        match direction {
            Direction::Next => seasons[season_idx + 1..]
                .iter()
                .find_map(|season| season.first_episode().map(|episode| Step::Crossing(season, episode))),
            Direction::Previous => seasons[..season_idx]
                .iter()
                .rev()
                .find_map(|season| season.last_episode().map(|episode| Step::Crossing(season, episode))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::host::HostError;
    use crate::app::model::Slot;

    #[derive(Default)]
    struct Tabs {
        activated: Vec<TabTarget>,
        fail: bool,
    }

    impl TabActivator for Tabs {
        fn activate_tab(&mut self, tab: &TabTarget) -> Result<(), HostError> {
            if self.fail {
                return Err(HostError::UnknownTab(tab.to_string()));
            }
            self.activated.push(tab.clone());
            Ok(())
        }
    }

    fn id(raw: &str) -> EpisodeId {
        EpisodeId::new(raw).expect("episode id")
    }

    fn season(season_id: &str, number: i32, episodes: &[Option<&str>]) -> Season {
        let season_key = SeasonId::new(season_id).expect("season id");
        let slots = episodes
            .iter()
            .enumerate()
            .map(|(idx, episode)| match episode {
                Some(raw) => Slot::Episode(Episode {
                    id: id(raw),
                    number: idx as u32 + 1,
                    season: season_key.clone(),
                    title: None,
                }),
                None => Slot::Spacer,
            })
            .collect();
        Season {
            id: season_key,
            number,
            title: None,
            slots,
        }
    }

    fn grid() -> EpisodeGrid {
        EpisodeGrid::new(vec![
            season("s1", 1, &[Some("1"), Some("2"), None, Some("3")]),
            season("s2", 2, &[Some("4"), None, Some("5"), Some("6")]),
            season("s3", 3, &[None]),
            season("s4", 4, &[Some("7")]),
        ])
    }

    #[test]
    fn next_and_prev_skip_spacers_within_a_season() {
        let grid = grid();
        let navigator = Navigator::new(&grid);
        let mut tabs = Tabs::default();

        let next = navigator.next(Some(&id("2")), &mut tabs).expect("next");
        assert_eq!(next.episode, id("3"));
        assert!(next.season_switch.is_none());

        let prev = navigator.prev(Some(&id("5")), &mut tabs).expect("prev");
        assert_eq!(prev.episode, id("4"));
        assert!(tabs.activated.is_empty());
    }

    #[test]
    fn prev_of_next_round_trips_inside_a_season() {
        let grid = grid();
        let navigator = Navigator::new(&grid);
        let mut tabs = Tabs::default();
        for interior in ["1", "2", "4", "5"] {
            let next = navigator.next(Some(&id(interior)), &mut tabs).expect("next");
            let back = navigator.prev(Some(&next.episode), &mut tabs).expect("prev");
            assert_eq!(back.episode, id(interior));
        }
        assert!(tabs.activated.is_empty());
    }

    #[test]
    fn crossing_a_boundary_activates_the_adjacent_season() {
        let grid = grid();
        let navigator = Navigator::new(&grid);
        let mut tabs = Tabs::default();

        let next = navigator.next(Some(&id("3")), &mut tabs).expect("next");
        assert_eq!(next.episode, id("4"));
        assert_eq!(
            next.season_switch,
            Some(SeasonSwitch {
                season: SeasonId::new("s2").expect("season id"),
                awaiting_shown: true,
            })
        );

        let prev = navigator.prev(Some(&id("4")), &mut tabs).expect("prev");
        assert_eq!(prev.episode, id("3"));
        assert_eq!(
            tabs.activated,
            vec![
                TabTarget::Season(SeasonId::new("s2").expect("season id")),
                TabTarget::Season(SeasonId::new("s1").expect("season id")),
            ]
        );
    }

    #[test]
    fn seasons_without_episodes_are_skipped() {
        let grid = grid();
        let navigator = Navigator::new(&grid);
        let mut tabs = Tabs::default();
        assert_eq!(navigator.next(Some(&id("6")), &mut tabs).map(|t| t.episode), Some(id("7")));
        assert_eq!(navigator.prev(Some(&id("7")), &mut tabs).map(|t| t.episode), Some(id("6")));
    }

    #[test]
    fn grid_ends_and_missing_current_yield_none() {
        let grid = grid();
        let navigator = Navigator::new(&grid);
        let mut tabs = Tabs::default();
        assert!(navigator.prev(Some(&id("1")), &mut tabs).is_none());
        assert!(navigator.next(Some(&id("7")), &mut tabs).is_none());
        assert!(navigator.next(None, &mut tabs).is_none());
        assert!(navigator.next(Some(&id("404")), &mut tabs).is_none());
        assert!(tabs.activated.is_empty());
    }

    #[test]
    fn failed_activation_still_returns_the_target() {
        let grid = grid();
        let navigator = Navigator::new(&grid);
        let mut tabs = Tabs {
            fail: true,
            ..Tabs::default()
        };
        let next = navigator.next(Some(&id("3")), &mut tabs).expect("next");
        assert_eq!(next.episode, id("4"));
        assert_eq!(next.season_switch.map(|s| s.awaiting_shown), Some(false));
    }

    #[test]
    fn peek_has_no_tab_side_effects() {
        let grid = grid();
        let navigator = Navigator::new(&grid);
        assert_eq!(
            navigator.peek(Some(&id("3")), Direction::Next).map(|e| e.id.clone()),
            Some(id("4"))
        );
        assert!(navigator.peek(Some(&id("1")), Direction::Previous).is_none());
    }
}
