mod catalog;
mod headless;
mod host;
mod layout;
pub(crate) mod model;
mod navigator;
mod orchestrator;
mod page;
mod player;
pub(crate) mod prefs;
mod resolver;
mod tui;


use std::thread;

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::cli::{Cli, Command};
use crate::db::Database;
use crate::paths::database_file_path;

use self::headless::HeadlessHost;
use self::host::Placeholder;
use self::model::SourceContext;
use self::orchestrator::{BOOTSTRAP_SETTLE_DELAY, SessionEvent, SessionOrchestrator};
use self::page::HostPage;
use self::player::HttpWatchTracker;
use self::prefs::{MemoryPreferenceStore, PrefKey, PreferenceStore};

/// Upper bound on host events drained per step; tab activations never chain
/// further than a season switch followed by a detail tab.
const MAX_HOST_EVENTS: usize = 32;

pub fn run(cli: Cli) -> Result<()> {
    let page = HostPage::load(&cli.page)?;

    match cli.command {
        Some(Command::Resume) => run_headless(&cli, page, None)?,
        Some(Command::Next) => run_headless(&cli, page, Some(SessionEvent::NextClicked))?,
        Some(Command::Prev) => run_headless(&cli, page, Some(SessionEvent::PrevClicked))?,
        Some(Command::Prefs) => run_prefs(&cli, &page)?,
        Some(Command::Forget) => run_forget(&cli, &page)?,
        Some(Command::Tui) | None => tui::run_tui(page, open_store(&cli)?)?,
    }

    Ok(())
}

fn run_headless(cli: &Cli, page: HostPage, action: Option<SessionEvent>) -> Result<()> {
    let store = open_store(cli)?;
    let host = HeadlessHost::new(
        page.grid
            .seasons()
            .iter()
            .map(|season| season.id.clone())
            .collect(),
    );
    let mut session =
        SessionOrchestrator::bootstrap(page, store, Box::new(HttpWatchTracker::new()), host);
    drain_host_events(&mut session);

    thread::sleep(BOOTSTRAP_SETTLE_DELAY);
    session.handle(SessionEvent::Settled);
    drain_host_events(&mut session);

    if let Some(action) = action {
        let before = session.state().current_episode().cloned();
        let direction = if action == SessionEvent::NextClicked {
            "next"
        } else {
            "previous"
        };
        session.handle(action);
        drain_host_events(&mut session);
        if before.is_none() {
            println!("No bookmarked episode to move from; pick one in the player first.");
        } else if session.state().current_episode() == before.as_ref() {
            println!("No {direction} episode available.");
        }
    }

    print_session_summary(&session);
    session.finish();
    Ok(())
}

fn drain_host_events(session: &mut SessionOrchestrator<HeadlessHost>) {
    for _ in 0..MAX_HOST_EVENTS {
        let Some(event) = session.host_mut().take_event() else {
            return;
        };
        session.handle(event);
    }
}

fn print_session_summary(session: &SessionOrchestrator<HeadlessHost>) {
    let state = session.state();
    println!("Title: {}", session.title());
    println!("  Layout: {}", state.layout());

    let grid = session.grid();
    match state.current_episode().and_then(|id| grid.episode(id)) {
        Some(episode) => {
            let season = grid
                .season(&episode.season)
                .map(|season| season.label())
                .unwrap_or_else(|| episode.season.to_string());
            println!("  Episode: {season} / {}", episode.label());
        }
        None => println!("  Episode: -"),
    }
    if let Some(season) = session.host().visible_season().and_then(|id| grid.season(id)) {
        println!("  Visible season: {}", season.label());
    }
    if let Some(tab) = session.host().detail_tab() {
        println!("  Detail tab: {tab}");
    }

    let source = state
        .current_source()
        .and_then(|id| session.sources().iter().find(|link| &link.id == id));
    match (source, session.host().player()) {
        (Some(link), Some(embed)) => {
            let scope = match link.context {
                SourceContext::Main => "title",
                SourceContext::Episode(_) => "episode",
            };
            println!("  Source: {} [{scope}]", link.button_label());
            println!("  URL: {}", embed.url);
        }
        _ => {
            let message = session
                .host()
                .placeholder()
                .map(Placeholder::message)
                .unwrap_or("-");
            println!("  Player: {message}");
        }
    }

    let nav = session.nav();
    println!(
        "  Navigation: prev {} / next {}",
        if nav.prev { "available" } else { "-" },
        if nav.next { "available" } else { "-" }
    );
}

fn run_prefs(cli: &Cli, page: &HostPage) -> Result<()> {
    if cli.ephemeral {
        println!("Ephemeral mode keeps no stored preferences.");
        return Ok(());
    }
    let db = open_db(cli)?;

    let mut keys = PrefKey::media_scoped(&page.media).to_vec();
    keys.push(PrefKey::Layout);

    let mut rows = Vec::new();
    for key in &keys {
        if let Some(stored) = db.stored_pref(&key.storage_key())? {
            rows.push(stored);
        }
    }
    if rows.is_empty() {
        println!("No stored preferences for {} yet.", page.title);
        return Ok(());
    }

    println!("{:<36} {:<20} {:<28}", "KEY", "VALUE", "UPDATED");
    for row in rows {
        println!(
            "{:<36} {:<20} {:<28}",
            truncate(&row.key, 36),
            truncate(&row.value, 20),
            format_updated_display(&row.updated_at)
        );
    }
    Ok(())
}

fn run_forget(cli: &Cli, page: &HostPage) -> Result<()> {
    let store = open_store(cli)?;
    let mut removed = 0;
    for key in PrefKey::media_scoped(&page.media) {
        if store.remove(&key)? {
            removed += 1;
        }
    }
    if removed == 0 {
        println!("Nothing stored for {}.", page.title);
    } else {
        println!("Forgot {removed} preference(s) for {}.", page.title);
    }
    Ok(())
}

fn open_store(cli: &Cli) -> Result<Box<dyn PreferenceStore>> {
    if cli.ephemeral {
        return Ok(Box::new(MemoryPreferenceStore::new()));
    }
    Ok(Box::new(open_db(cli)?))
}

fn open_db(cli: &Cli) -> Result<Database> {
    let db_path = match &cli.db_path {
        Some(path) => path.clone(),
        None => database_file_path()?,
    };
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}

fn format_updated_display(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M %:z")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}
