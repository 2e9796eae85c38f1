use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap};

use super::super::host::Placeholder;
use super::super::layout::EpisodePlacement;
use super::super::model::{LayoutMode, Season, Slot};
use super::super::orchestrator::SessionOrchestrator;
use super::super::truncate;
use super::host::{PlayerPane, TuiHost};
use super::{EpisodeCursor, visible_season};

const GRID_CELL_WIDTH: u16 = 6;

pub(super) fn draw_tui(
    frame: &mut Frame,
    session: &SessionOrchestrator<TuiHost>,
    cursor: &mut EpisodeCursor,
    status: &str,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(header(session), chunks[0]);
    frame.render_widget(season_bar(session), chunks[1]);

    if session.host().detail_tab().is_watch() {
        draw_watch_body(frame, session, cursor, chunks[2]);
    } else {
        frame.render_widget(info_panel(session), chunks[2]);
    }

    let sources = Paragraph::new(source_line(session))
        .alignment(Alignment::Center)
        .block(panel_block("Sources"));
    frame.render_widget(sources, chunks[3]);

    let controls = Paragraph::new(vec![layout_line(session), hint_line()])
        .alignment(Alignment::Center)
        .block(panel_block("Controls"));
    frame.render_widget(controls, chunks[4]);

    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[5]);
}

fn header(session: &SessionOrchestrator<TuiHost>) -> Paragraph<'static> {
    let state = session.state();
    let episode_text = state
        .current_episode()
        .and_then(|id| session.grid().episode(id))
        .map(|episode| episode.label())
        .unwrap_or_else(|| "-".to_string());
    Paragraph::new(Line::from(vec![
        Span::styled(
            truncate(session.title(), 40),
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!("episode {episode_text}"),
            Style::default().fg(Color::Rgb(185, 195, 210)),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(state.layout().label(), Style::default().fg(Color::Yellow)),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Now Watching"))
}

fn season_bar(session: &SessionOrchestrator<TuiHost>) -> Paragraph<'static> {
    if session.state().layout() == LayoutMode::PlayerOnly {
        return Paragraph::new("Playing the main feature; episodes are hidden.")
            .style(Style::default().fg(Color::Rgb(125, 135, 150)))
            .alignment(Alignment::Center)
            .block(panel_block("Seasons"));
    }

    let visible = session.host().visible_season();
    let mut spans = Vec::new();
    for season in session.grid().seasons() {
        let style = if Some(&season.id) == visible {
            pill_active()
        } else {
            pill_inactive()
        };
        spans.push(Span::styled(format!(" {} ", season.label()), style));
        spans.push(Span::styled(" ", Style::default()));
    }
    if spans.is_empty() {
        spans.push(Span::styled(
            "No seasons listed.",
            Style::default().fg(Color::Rgb(125, 135, 150)),
        ));
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(panel_block("Seasons"))
}

fn draw_watch_body(
    frame: &mut Frame,
    session: &SessionOrchestrator<TuiHost>,
    cursor: &mut EpisodeCursor,
    area: Rect,
) {
    let params = session.layout_params();
    let share = params.player_share.min(100);
    let direction = match params.episodes {
        EpisodePlacement::Right => Direction::Horizontal,
        EpisodePlacement::Below | EpisodePlacement::Hidden => Direction::Vertical,
    };
    let panes = Layout::default()
        .direction(direction)
        .constraints([
            Constraint::Percentage(share),
            Constraint::Percentage(100 - share),
        ])
        .split(area);

    frame.render_widget(player_panel(session), panes[0]);

    let season = visible_season(session);
    match params.episodes {
        EpisodePlacement::Hidden => {}
        EpisodePlacement::Below => draw_episode_grid(frame, session, season, cursor, panes[1]),
        EpisodePlacement::Right if params.independent_scroll => {
            draw_episode_list(frame, session, season, cursor, panes[1], params.compact_entries);
        }
        EpisodePlacement::Right => draw_episode_grid(frame, session, season, cursor, panes[1]),
    }
}

fn player_panel(session: &SessionOrchestrator<TuiHost>) -> Paragraph<'static> {
    let text = match session.host().pane() {
        PlayerPane::Playing(embed) => {
            let source = session
                .sources()
                .iter()
                .find(|link| link.id == embed.link)
                .map(|link| link.button_label())
                .unwrap_or_else(|| embed.link.to_string());
            vec![
                Line::from(Span::styled(
                    "▶ Playing",
                    Style::default()
                        .fg(Color::Rgb(130, 220, 160))
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(format!("Source: {source}")),
                Line::from(Span::styled(
                    embed.url.clone(),
                    Style::default().fg(Color::Rgb(185, 195, 210)),
                )),
            ]
        }
        PlayerPane::Placeholder(placeholder) => {
            let style = match placeholder {
                Placeholder::Prompt(_) => Style::default().fg(Color::Rgb(185, 195, 210)),
                Placeholder::Empty(_) => Style::default().fg(Color::Yellow),
                Placeholder::Error(_) => Style::default()
                    .fg(Color::Rgb(255, 145, 120))
                    .add_modifier(Modifier::BOLD),
            };
            vec![Line::from(Span::styled(
                placeholder.message().to_string(),
                style,
            ))]
        }
    };
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(panel_block("Player"))
}

fn draw_episode_grid(
    frame: &mut Frame,
    session: &SessionOrchestrator<TuiHost>,
    season: Option<&Season>,
    cursor: &mut EpisodeCursor,
    area: Rect,
) {
    let block = panel_block("Episodes");
    let inner = block.inner(area);
    let columns = usize::from((inner.width / GRID_CELL_WIDTH).max(1));
    cursor.set_row_len(columns);

    let Some(season) = season else {
        let empty = Paragraph::new("No episodes listed.").block(block);
        frame.render_widget(empty, area);
        return;
    };

    let current = session.state().current_episode();
    let lines: Vec<Line> = season
        .slots
        .chunks(columns)
        .enumerate()
        .map(|(row, slots)| {
            let spans = slots
                .iter()
                .enumerate()
                .flat_map(|(col, slot)| {
                    let idx = row * columns + col;
                    let cell = match slot {
                        Slot::Episode(episode) => {
                            let style = if Some(&episode.id) == current {
                                pill_active()
                            } else if cursor.slot() == Some(idx) {
                                pill_cursor()
                            } else {
                                pill_inactive()
                            };
                            Span::styled(format!(" {:>3} ", episode.number), style)
                        }
                        Slot::Spacer => Span::raw("     "),
                    };
                    [cell, Span::raw(" ")]
                })
                .collect::<Vec<_>>();
            Line::from(spans)
        })
        .collect();

    let cursor_row = cursor.slot().map(|slot| slot / columns).unwrap_or(0);
    let visible_rows = usize::from(inner.height.max(1));
    let scroll = cursor_row.saturating_sub(visible_rows.saturating_sub(1));
    let grid = Paragraph::new(lines)
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
        .block(block.title(season.label()));
    frame.render_widget(grid, area);
}

fn draw_episode_list(
    frame: &mut Frame,
    session: &SessionOrchestrator<TuiHost>,
    season: Option<&Season>,
    cursor: &mut EpisodeCursor,
    area: Rect,
    compact: bool,
) {
    cursor.set_row_len(1);
    let title_width = if compact { 18 } else { 48 };
    let current = session.state().current_episode();
    let items: Vec<ListItem> = season
        .map(|season| {
            season
                .slots
                .iter()
                .map(|slot| match slot {
                    Slot::Episode(episode) => {
                        let marker = if Some(&episode.id) == current { "▶ " } else { "  " };
                        let text = match episode.title.as_deref() {
                            Some(title) => format!(
                                "{marker}{:>3}  {}",
                                episode.number,
                                truncate(title, title_width)
                            ),
                            None => format!("{marker}{:>3}", episode.number),
                        };
                        ListItem::new(text)
                    }
                    Slot::Spacer => ListItem::new(""),
                })
                .collect()
        })
        .unwrap_or_default();

    let title = season
        .map(|season| season.label())
        .unwrap_or_else(|| "Episodes".to_string());
    let list = List::new(items)
        .block(panel_block("Episodes").title(title))
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(110, 170, 255))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(list, area, cursor.list_state());
}

fn info_panel(session: &SessionOrchestrator<TuiHost>) -> Paragraph<'static> {
    let grid = session.grid();
    let catalog = session.catalog();
    let text = format!(
        "Title\n{}\n\nMedia ID\n{}\n\nSeasons\n{}\n\nEpisodes\n{} listed, {} with sources\n\nMain sources\n{}",
        truncate(session.title(), 60),
        session.media(),
        grid.seasons().len(),
        grid.episode_count(),
        catalog.episode_count(),
        catalog.main_links().len(),
    );
    Paragraph::new(text)
        .style(Style::default().fg(Color::Rgb(230, 230, 230)))
        .block(panel_block("Info"))
}

fn source_line(session: &SessionOrchestrator<TuiHost>) -> Line<'static> {
    let current = session.state().current_source();
    let mut spans = Vec::new();
    for link in session.sources() {
        let style = if Some(&link.id) == current {
            pill_active()
        } else {
            pill_inactive()
        };
        spans.push(Span::styled(format!(" {} ", link.button_label()), style));
        spans.push(Span::styled(" ", Style::default()));
    }
    if spans.is_empty() {
        spans.push(Span::styled(
            "No sources for the current selection.",
            Style::default().fg(Color::Rgb(125, 135, 150)),
        ));
    }
    Line::from(spans)
}

fn layout_line(session: &SessionOrchestrator<TuiHost>) -> Line<'static> {
    let current = session.state().layout();
    let mut spans = Vec::new();
    for (idx, (mode, enabled)) in session.layout_options().into_iter().enumerate() {
        let radio = if mode == current { "(•)" } else { "( )" };
        let style = if !enabled {
            Style::default().fg(Color::Rgb(72, 82, 96))
        } else if mode == current {
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Rgb(230, 235, 242))
        };
        spans.push(Span::styled(
            format!("{} {radio} {}   ", idx + 1, mode.label()),
            style,
        ));
    }

    let nav = session.nav();
    spans.push(Span::styled(" ◀ PREV ", nav_style(nav.prev)));
    spans.push(Span::styled(" ", Style::default()));
    spans.push(Span::styled(" NEXT ▶ ", nav_style(nav.next)));
    Line::from(spans)
}

fn hint_line() -> Line<'static> {
    Line::from(Span::styled(
        "Tab season  ←/→/↑/↓ move  Enter play  [/] source  p/n prev/next  1-3 layout  i info  q quit",
        Style::default().fg(Color::Rgb(185, 195, 210)),
    ))
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn pill_active() -> Style {
    Style::default()
        .bg(Color::Rgb(110, 170, 255))
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn pill_cursor() -> Style {
    Style::default()
        .bg(Color::Rgb(205, 165, 255))
        .fg(Color::Black)
}

fn pill_inactive() -> Style {
    Style::default()
        .bg(Color::Rgb(72, 82, 96))
        .fg(Color::Rgb(230, 235, 242))
}

fn nav_style(enabled: bool) -> Style {
    if enabled {
        pill_inactive()
    } else {
        Style::default().fg(Color::Rgb(72, 82, 96))
    }
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}
