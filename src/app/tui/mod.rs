mod host;
mod render;
mod terminal;

use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::widgets::ListState;

use super::host::{TabActivator, TabTarget};
use super::model::{DetailTab, EpisodeId, LayoutMode, Season, SeasonId, SourceLinkId};
use super::orchestrator::{BOOTSTRAP_SETTLE_DELAY, SessionEvent, SessionOrchestrator};
use super::page::HostPage;
use super::player::HttpWatchTracker;
use super::prefs::PreferenceStore;

use self::host::TuiHost;
use self::render::draw_tui;
use self::terminal::TerminalGuard;

const IDLE_POLL: Duration = Duration::from_millis(200);

/// Highlighted slot in the visible season pane. Follows the playing episode
/// when it lands in the visible season.
#[derive(Debug, Default)]
pub(super) struct EpisodeCursor {
    season: Option<SeasonId>,
    slot: Option<usize>,
    followed: Option<EpisodeId>,
    row_len: usize,
    list_state: ListState,
}

impl EpisodeCursor {
    fn sync(&mut self, season: Option<&Season>, current: Option<&EpisodeId>) {
        let Some(season) = season else {
            self.season = None;
            self.slot = None;
            self.list_state.select(None);
            return;
        };
        let current_slot = current.and_then(|id| slot_of(season, id));
        if self.season.as_ref() != Some(&season.id) {
            self.season = Some(season.id.clone());
            self.slot = current_slot.or_else(|| first_episode_slot(season));
        } else if current != self.followed.as_ref() && current_slot.is_some() {
            self.slot = current_slot;
        }
        self.followed = current.cloned();
        self.list_state.select(self.slot);
    }

    /// Moves by `delta` slots, skipping spacers; stays put at the edges.
    fn step(&mut self, season: &Season, delta: isize) {
        let Some(from) = self.slot else {
            self.slot = first_episode_slot(season);
            return;
        };
        let unit = delta.signum();
        let mut idx = from as isize + delta;
        while idx >= 0 && (idx as usize) < season.slots.len() {
            if season.slots[idx as usize].episode().is_some() {
                self.slot = Some(idx as usize);
                self.list_state.select(self.slot);
                return;
            }
            idx += unit;
        }
    }

    fn episode(&self, season: &Season) -> Option<EpisodeId> {
        let slot = season.slots.get(self.slot?)?;
        slot.episode().map(|episode| episode.id.clone())
    }

    fn row_step(&self) -> isize {
        self.row_len.max(1) as isize
    }

    pub(super) fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub(super) fn set_row_len(&mut self, row_len: usize) {
        self.row_len = row_len;
    }

    pub(super) fn list_state(&mut self) -> &mut ListState {
        &mut self.list_state
    }
}

fn slot_of(season: &Season, id: &EpisodeId) -> Option<usize> {
    season
        .slots
        .iter()
        .position(|slot| slot.episode().is_some_and(|episode| &episode.id == id))
}

fn first_episode_slot(season: &Season) -> Option<usize> {
    season.slots.iter().position(|slot| slot.episode().is_some())
}

fn visible_season(session: &SessionOrchestrator<TuiHost>) -> Option<&Season> {
    let grid = session.grid();
    session
        .host()
        .visible_season()
        .and_then(|id| grid.season(id))
        .or_else(|| grid.first_season())
}

pub(crate) fn run_tui(page: HostPage, store: Box<dyn PreferenceStore>) -> Result<()> {
    let (events_tx, events_rx) = mpsc::channel::<SessionEvent>();
    let seasons = page
        .grid
        .seasons()
        .iter()
        .map(|season| season.id.clone())
        .collect();
    let host = TuiHost::new(seasons, events_tx);
    let mut session =
        SessionOrchestrator::bootstrap(page, store, Box::new(HttpWatchTracker::new()), host);

    let mut guard = TerminalGuard::enter()?;
    let started = Instant::now();
    let mut settled = false;
    let mut cursor = EpisodeCursor::default();
    let mut status = status_info("Loading...");

    loop {
        drain_session_events(&events_rx, &mut session);
        if !settled && started.elapsed() >= BOOTSTRAP_SETTLE_DELAY {
            settled = true;
            session.handle(SessionEvent::Settled);
            drain_session_events(&events_rx, &mut session);
            status = status_info("Ready.");
        }

        cursor.sync(
            visible_season(&session),
            session.state().current_episode(),
        );
        guard
            .terminal()
            .draw(|frame| draw_tui(frame, &session, &mut cursor, &status))?;

        let timeout = if settled {
            IDLE_POLL
        } else {
            BOOTSTRAP_SETTLE_DELAY.saturating_sub(started.elapsed())
        };
        if !event::poll(timeout)? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') => break,
            KeyCode::Tab => status = switch_season(&mut session, true),
            KeyCode::BackTab => status = switch_season(&mut session, false),
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => {
                let delta = match key.code {
                    KeyCode::Left => -1,
                    KeyCode::Right => 1,
                    KeyCode::Up => -cursor.row_step(),
                    _ => cursor.row_step(),
                };
                if let Some(season) = visible_season(&session) {
                    cursor.step(season, delta);
                }
            }
            KeyCode::Enter => {
                if session.state().layout() == LayoutMode::PlayerOnly {
                    status = status_info("Episodes are hidden in the player-only layout.");
                    continue;
                }
                let Some(episode) = visible_season(&session).and_then(|season| cursor.episode(season))
                else {
                    status = status_error("No episode under the cursor.");
                    continue;
                };
                session.handle(SessionEvent::EpisodeClicked(episode));
                status = playing_status(&session);
            }
            KeyCode::Char('n') => {
                if session.nav().next {
                    session.handle(SessionEvent::NextClicked);
                    status = status_info("Moving to the next episode.");
                } else {
                    status = status_info("No next episode available.");
                }
            }
            KeyCode::Char('p') => {
                if session.nav().prev {
                    session.handle(SessionEvent::PrevClicked);
                    status = status_info("Moving to the previous episode.");
                } else {
                    status = status_info("No previous episode available.");
                }
            }
            KeyCode::Char('[') | KeyCode::Char(']') => {
                let forward = key.code == KeyCode::Char(']');
                let Some(link) = neighbour_source(&session, forward) else {
                    status = status_info("No other sources for the current selection.");
                    continue;
                };
                session.handle(SessionEvent::SourceClicked(link));
                status = playing_status(&session);
            }
            KeyCode::Char(digit @ '1'..='3') => {
                let idx = (digit as usize) - ('1' as usize);
                let mode = LayoutMode::ALL[idx];
                let enabled = session
                    .layout_options()
                    .iter()
                    .any(|(option, enabled)| *option == mode && *enabled);
                if enabled {
                    session.handle(SessionEvent::LayoutSelected(mode));
                    status = status_info(&format!("Layout: {}", mode.label()));
                } else {
                    status = status_error("Player-only layout needs sources for the title itself.");
                }
            }
            KeyCode::Char('i') => {
                let target = if session.host().detail_tab().is_watch() {
                    DetailTab::info()
                } else {
                    DetailTab::watch()
                };
                if let Err(err) = session
                    .host_mut()
                    .activate_tab(&TabTarget::Detail(target))
                {
                    status = status_error(&format!("Tab switch failed: {err}"));
                }
            }
            _ => {}
        }
    }

    guard.leave()?;
    session.finish();
    Ok(())
}

fn drain_session_events(
    events_rx: &Receiver<SessionEvent>,
    session: &mut SessionOrchestrator<TuiHost>,
) {
    while let Ok(event) = events_rx.try_recv() {
        session.handle(event);
    }
}

fn switch_season(session: &mut SessionOrchestrator<TuiHost>, forward: bool) -> String {
    if session.state().layout() == LayoutMode::PlayerOnly {
        return status_info("Seasons are hidden in the player-only layout.");
    }
    let seasons = session.grid().seasons();
    if seasons.is_empty() {
        return status_info("No seasons listed.");
    }
    let current = session
        .host()
        .visible_season()
        .and_then(|id| seasons.iter().position(|season| &season.id == id))
        .unwrap_or(0);
    let next = if forward {
        (current + 1) % seasons.len()
    } else {
        (current + seasons.len() - 1) % seasons.len()
    };
    let target = seasons[next].id.clone();
    let label = seasons[next].label();
    match session.host_mut().activate_tab(&TabTarget::Season(target)) {
        Ok(()) => status_info(&label),
        Err(err) => status_error(&format!("Tab switch failed: {err}")),
    }
}

fn neighbour_source(session: &SessionOrchestrator<TuiHost>, forward: bool) -> Option<SourceLinkId> {
    let sources = session.sources();
    if sources.len() < 2 {
        return None;
    }
    let current = session
        .state()
        .current_source()
        .and_then(|id| sources.iter().position(|link| &link.id == id))
        .unwrap_or(0);
    let next = if forward {
        (current + 1) % sources.len()
    } else {
        (current + sources.len() - 1) % sources.len()
    };
    Some(sources[next].id.clone())
}

fn playing_status(session: &SessionOrchestrator<TuiHost>) -> String {
    let playing = session
        .state()
        .current_source()
        .and_then(|id| session.sources().iter().find(|link| &link.id == id));
    match playing {
        Some(link) => status_info(&format!("Playing {}", link.button_label())),
        None => status_info("Nothing to play for this selection."),
    }
}

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::model::{Episode, Slot};

    fn season(slots: &[Option<&str>]) -> Season {
        let id = SeasonId::new("1").expect("season id");
        Season {
            id: id.clone(),
            number: 1,
            title: None,
            slots: slots
                .iter()
                .enumerate()
                .map(|(idx, slot)| match slot {
                    Some(raw) => Slot::Episode(Episode {
                        id: EpisodeId::new(raw).expect("episode id"),
                        number: idx as u32 + 1,
                        season: id.clone(),
                        title: None,
                    }),
                    None => Slot::Spacer,
                })
                .collect(),
        }
    }

    #[test]
    fn cursor_skips_spacers_and_stops_at_edges() {
        let season = season(&[Some("1"), None, None, Some("4"), None]);
        let mut cursor = EpisodeCursor::default();
        cursor.sync(Some(&season), None);
        assert_eq!(cursor.slot(), Some(0));

        cursor.step(&season, 1);
        assert_eq!(cursor.slot(), Some(3));
        cursor.step(&season, 1);
        assert_eq!(cursor.slot(), Some(3));
        cursor.step(&season, -1);
        assert_eq!(cursor.slot(), Some(0));
        cursor.step(&season, -1);
        assert_eq!(cursor.slot(), Some(0));
    }

    #[test]
    fn cursor_follows_the_playing_episode() {
        let season = season(&[Some("1"), Some("2"), Some("3")]);
        let mut cursor = EpisodeCursor::default();
        cursor.sync(Some(&season), None);
        cursor.step(&season, 1);

        let playing = EpisodeId::new("3").expect("id");
        cursor.sync(Some(&season), Some(&playing));
        assert_eq!(cursor.episode(&season), Some(playing.clone()));

        // Manual movement sticks while the playing episode is unchanged.
        cursor.step(&season, -2);
        cursor.sync(Some(&season), Some(&playing));
        assert_eq!(cursor.slot(), Some(0));
    }
}
