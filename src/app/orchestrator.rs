use std::time::Duration;

use tracing::{debug, info, warn};

use super::catalog::LinkCatalog;
use super::host::{Placeholder, SessionHost, TabTarget};
use super::layout::{LayoutController, LayoutParams};
use super::model::{
    DetailTab, EpisodeId, LayoutMode, MediaId, SeasonId, SourceContext, SourceLink, SourceLinkId,
};
use super::navigator::{Direction, EpisodeGrid, Navigator};
use super::page::HostPage;
use super::player::{LoadRequest, PlayerLoader, WatchTracker};
use super::prefs::{PreferenceStore, Preferences};
use super::resolver::resolve_sources;

/// Delay between bootstrap and restoring the watched episode, so the host's
/// initial tab activation has settled.
pub(crate) const BOOTSTRAP_SETTLE_DELAY: Duration = Duration::from_millis(150);

pub(crate) const PROMPT_SELECT_EPISODE: &str = "Select an episode to start watching.";
pub(crate) const EMPTY_EPISODE_SOURCES: &str = "No sources are available for this episode yet.";
pub(crate) const EMPTY_MAIN_SOURCES: &str = "No sources are available for this title yet.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionEvent {
    EpisodeClicked(EpisodeId),
    SourceClicked(SourceLinkId),
    NextClicked,
    PrevClicked,
    LayoutSelected(LayoutMode),
    TabShown(TabTarget),
    /// Deferred bootstrap continuation, delivered `BOOTSTRAP_SETTLE_DELAY` after start.
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectOrigin {
    /// A direct click on the episode.
    User,
    /// Next/previous controls.
    Navigation,
    /// Bookmark restoration.
    Restore,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct NavButtons {
    pub(crate) prev: bool,
    pub(crate) next: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SessionState {
    current_episode: Option<EpisodeId>,
    current_source: Option<SourceLinkId>,
    layout: LayoutMode,
}

impl SessionState {
    pub(crate) fn current_episode(&self) -> Option<&EpisodeId> {
        self.current_episode.as_ref()
    }

    pub(crate) fn current_source(&self) -> Option<&SourceLinkId> {
        self.current_source.as_ref()
    }

    pub(crate) fn layout(&self) -> LayoutMode {
        self.layout
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingSelection {
    season: SeasonId,
    episode: EpisodeId,
    origin: SelectOrigin,
}

pub(crate) struct SessionOrchestrator<H> {
    media: MediaId,
    title: String,
    grid: EpisodeGrid,
    catalog: LinkCatalog,
    layout: LayoutController,
    loader: PlayerLoader,
    prefs: Preferences,
    host: H,
    state: SessionState,
    sources: Vec<SourceLink>,
    nav: NavButtons,
    active_season: Option<SeasonId>,
    pending: Option<PendingSelection>,
    settled: bool,
}

impl<H: SessionHost> SessionOrchestrator<H> {
    /// First bootstrap phase: layout, detail tab and the initial prompt. The
    /// watched episode is restored when `SessionEvent::Settled` arrives.
    pub(crate) fn bootstrap(
        page: HostPage,
        store: Box<dyn PreferenceStore>,
        tracker: Box<dyn WatchTracker>,
        host: H,
    ) -> Self {
        let HostPage {
            media,
            title,
            grid,
            catalog,
            catalog_warnings,
            play_url_template,
            tracking,
        } = page;
        for warning in &catalog_warnings {
            warn!("{warning}");
        }

        let prefs = Preferences::new(store, media.clone());
        let loader = PlayerLoader::new(play_url_template.as_deref(), tracking, tracker);
        let layout = LayoutController::new(catalog.has_main_links());
        let active_season = grid.first_season().map(|season| season.id.clone());

        let mut session = Self {
            media,
            title,
            grid,
            catalog,
            layout,
            loader,
            prefs,
            host,
            state: SessionState::default(),
            sources: Vec::new(),
            nav: NavButtons::default(),
            active_season,
            pending: None,
            settled: false,
        };

        let stored = session.prefs.layout();
        let initial = session.layout.initial_mode(stored);
        if stored.is_some_and(|mode| mode != initial) {
            info!(stored = ?stored, effective = %initial, "stored layout unavailable, using default");
        }
        session.commit_layout(initial);

        if let Some(tab) = session.prefs.detail_tab() {
            session.activate(TabTarget::Detail(tab));
        }
        session
            .host
            .show_placeholder(Placeholder::Prompt(PROMPT_SELECT_EPISODE.to_string()));
        info!(media = %session.media, layout = %session.state.layout, "session bootstrapped");
        session
    }

    pub(crate) fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::EpisodeClicked(episode) => {
                self.select_episode(&episode, SelectOrigin::User);
            }
            SessionEvent::SourceClicked(link) => self.select_source(&link),
            SessionEvent::NextClicked => self.navigate(Direction::Next),
            SessionEvent::PrevClicked => self.navigate(Direction::Previous),
            SessionEvent::LayoutSelected(mode) => self.change_layout(mode),
            SessionEvent::TabShown(tab) => self.tab_shown(tab),
            SessionEvent::Settled => self.restore_watched(),
        }
    }

    pub(crate) fn state(&self) -> &SessionState {
        &self.state
    }

    pub(crate) fn media(&self) -> &MediaId {
        &self.media
    }

    pub(crate) fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn grid(&self) -> &EpisodeGrid {
        &self.grid
    }

    pub(crate) fn catalog(&self) -> &LinkCatalog {
        &self.catalog
    }

    /// Sources offered for the current context, in display order.
    pub(crate) fn sources(&self) -> &[SourceLink] {
        &self.sources
    }

    pub(crate) fn nav(&self) -> NavButtons {
        self.nav
    }

    pub(crate) fn layout_params(&self) -> LayoutParams {
        self.layout.params()
    }

    pub(crate) fn layout_options(&self) -> [(LayoutMode, bool); 3] {
        self.layout.options()
    }

    #[cfg(test)]
    pub(crate) fn active_season(&self) -> Option<&SeasonId> {
        self.active_season.as_ref()
    }

    pub(crate) fn host(&self) -> &H {
        &self.host
    }

    pub(crate) fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Waits for outstanding watch-history deliveries.
    pub(crate) fn finish(&self) {
        self.loader.drain();
    }

    fn restore_watched(&mut self) {
        if self.settled {
            debug!("bootstrap already settled");
            return;
        }
        self.settled = true;
        if self.layout.mode() == LayoutMode::PlayerOnly {
            self.show_sources(SourceContext::Main);
        } else {
            self.restore_bookmarked_episode();
        }
    }

    fn restore_bookmarked_episode(&mut self) {
        let Some(episode) = self.prefs.last_episode() else {
            self.show_prompt();
            return;
        };
        let Some(season) = self.grid.episode(&episode).map(|found| found.season.clone()) else {
            info!(episode = %episode, "bookmarked episode is no longer listed");
            self.show_prompt();
            return;
        };
        info!(episode = %episode, season = %season, "restoring bookmarked episode");
        self.select_when_shown(season, episode, SelectOrigin::Restore);
    }

    fn select_when_shown(&mut self, season: SeasonId, episode: EpisodeId, origin: SelectOrigin) {
        if self.active_season.as_ref() == Some(&season) {
            self.select_episode(&episode, origin);
            return;
        }
        self.pending = Some(PendingSelection {
            season: season.clone(),
            episode: episode.clone(),
            origin,
        });
        if !self.activate(TabTarget::Season(season)) {
            self.pending = None;
            self.select_episode(&episode, origin);
        }
    }

    fn tab_shown(&mut self, tab: TabTarget) {
        match tab {
            TabTarget::Season(season) => {
                self.active_season = Some(season.clone());
                if self
                    .pending
                    .as_ref()
                    .is_some_and(|pending| pending.season == season)
                    && let Some(pending) = self.pending.take()
                {
                    self.select_episode(&pending.episode, pending.origin);
                }
            }
            TabTarget::Detail(detail) => self.prefs.remember_detail_tab(&detail),
        }
    }

    /// The single path by which an episode becomes current.
    fn select_episode(&mut self, episode_id: &EpisodeId, origin: SelectOrigin) -> bool {
        if self.layout.mode() == LayoutMode::PlayerOnly {
            debug!(episode = %episode_id, "episode selection ignored in player-only layout");
            return false;
        }
        let Some(episode) = self.grid.episode(episode_id) else {
            warn!(episode = %episode_id, "selected episode is not in the grid");
            return false;
        };
        let episode_id = episode.id.clone();

        self.pending = None;
        self.state.current_episode = Some(episode_id.clone());
        self.state.current_source = None;
        self.refresh_nav();
        self.show_sources(SourceContext::Episode(episode_id));

        if origin == SelectOrigin::User {
            self.activate(TabTarget::Detail(DetailTab::watch()));
        }
        true
    }

    fn select_source(&mut self, link_id: &SourceLinkId) {
        let Some(link) = self.sources.iter().find(|link| &link.id == link_id).cloned() else {
            warn!(link = %link_id, "clicked source is not offered in the current context");
            return;
        };
        self.play(&link);
    }

    fn show_sources(&mut self, context: SourceContext) {
        let preferred = self.prefs.last_translation();
        let resolution = resolve_sources(&self.catalog, &context, preferred.as_ref());
        let Some(chosen) = resolution.selected().cloned() else {
            debug!(context = ?context, "no sources to play");
            self.sources.clear();
            self.state.current_source = None;
            let message = match context {
                SourceContext::Main => EMPTY_MAIN_SOURCES,
                SourceContext::Episode(_) => EMPTY_EPISODE_SOURCES,
            };
            self.host
                .show_placeholder(Placeholder::Empty(message.to_string()));
            return;
        };
        self.sources = resolution.sources().to_vec();
        self.play(&chosen);
    }

    /// The single path by which a source starts playing.
    fn play(&mut self, link: &SourceLink) {
        let request = LoadRequest::for_link(link);
        let loaded = self.loader.load(
            &request,
            self.layout.mode(),
            self.state.current_episode.as_ref(),
            &self.prefs,
            &mut self.host,
        );
        self.state.current_source = loaded.ok().map(|embed| embed.link);
    }

    fn navigate(&mut self, direction: Direction) {
        if !self.layout.nav_enabled() {
            debug!(direction = direction.label(), "navigation disabled in player-only layout");
            return;
        }
        let navigator = Navigator::new(&self.grid);
        let current = self.state.current_episode.as_ref();
        let target = match direction {
            Direction::Next => navigator.next(current, &mut self.host),
            Direction::Previous => navigator.prev(current, &mut self.host),
        };
        let Some(target) = target else {
            debug!(direction = direction.label(), "no episode in that direction");
            return;
        };

        match target.season_switch {
            Some(switch)
                if switch.awaiting_shown && self.active_season.as_ref() != Some(&switch.season) =>
            {
                self.pending = Some(PendingSelection {
                    season: switch.season,
                    episode: target.episode,
                    origin: SelectOrigin::Navigation,
                });
            }
            _ => {
                self.select_episode(&target.episode, SelectOrigin::Navigation);
            }
        }
    }

    fn change_layout(&mut self, mode: LayoutMode) {
        let transition = match self.layout.request(mode) {
            Ok(Some(transition)) => transition,
            Ok(None) => return,
            Err(err) => {
                warn!("{err}");
                return;
            }
        };
        info!(from = %transition.from, to = %transition.to, "layout changed");
        self.commit_layout(transition.to);

        if transition.enters_player_only() {
            self.state.current_episode = None;
            self.state.current_source = None;
            self.pending = None;
            self.show_sources(SourceContext::Main);
        } else if transition.leaves_player_only() {
            self.sources.clear();
            self.state.current_source = None;
            self.restore_bookmarked_episode();
        }
    }

    fn commit_layout(&mut self, mode: LayoutMode) {
        if self.layout.mode() != mode && self.layout.request(mode).is_err() {
            return;
        }
        self.state.layout = mode;
        self.prefs.remember_layout(mode);
        self.refresh_nav();
    }

    fn refresh_nav(&mut self) {
        if !self.layout.nav_enabled() {
            self.nav = NavButtons::default();
            return;
        }
        let navigator = Navigator::new(&self.grid);
        let current = self.state.current_episode.as_ref();
        self.nav = NavButtons {
            prev: navigator.peek(current, Direction::Previous).is_some(),
            next: navigator.peek(current, Direction::Next).is_some(),
        };
    }

    fn show_prompt(&mut self) {
        self.state.current_episode = None;
        self.state.current_source = None;
        self.sources.clear();
        self.refresh_nav();
        self.host
            .show_placeholder(Placeholder::Prompt(PROMPT_SELECT_EPISODE.to_string()));
    }

    fn activate(&mut self, tab: TabTarget) -> bool {
        match self.host.activate_tab(&tab) {
            Ok(()) => true,
            Err(err) => {
                warn!(tab = %tab, "tab activation failed: {err}");
                false
            }
        }
    }
}
