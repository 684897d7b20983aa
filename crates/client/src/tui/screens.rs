use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph};

use quizsync::game::view::{
    AnswerMark, answer_views, elapsed_fraction, headline, remaining_secs, standings,
};
use quizsync::{GamePhase, SyncStatus, SyncView};

const BAR_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, view: &SyncView, now_ms: u64, selected: usize) {
    let area = frame.area();

    let block = Block::default()
        .title(" Quiz ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(block, area);

    let player_rows = view.snapshot.players.len().max(1) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(player_rows + 2),
            Constraint::Length(1),
        ])
        .split(area);

    render_headline(frame, chunks[0], view);
    render_timebar(frame, chunks[1], view, now_ms);
    render_answers(frame, chunks[2], view, selected);
    render_standings(frame, chunks[3], view);
    render_status(frame, chunks[4], view);
}

fn render_headline(frame: &mut Frame, area: Rect, view: &SyncView) {
    let text = Paragraph::new(headline(&view.snapshot))
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    frame.render_widget(text, area);
}

fn render_timebar(frame: &mut Frame, area: Rect, view: &SyncView, now_ms: u64) {
    let Some(window) = view.snapshot.phase.window() else {
        return;
    };
    let Some(ratio) = elapsed_fraction(window, now_ms, view.offset_ms) else {
        return;
    };

    let color = match view.snapshot.phase {
        GamePhase::InGameAnswerPending(_) => Color::Green,
        _ => Color::Blue,
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(format!("{}s", remaining_secs(window, now_ms, view.offset_ms)));
    frame.render_widget(gauge, area);
}

fn render_answers(frame: &mut Frame, area: Rect, view: &SyncView, selected: usize) {
    let answers = answer_views(&view.snapshot, &view.user);
    if answers.is_empty() {
        return;
    }

    let items: Vec<ListItem> = answers
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            let cursor = if i == selected { "> " } else { "  " };
            let tick = if answer.selected { " *" } else { "" };

            let mut spans = vec![Span::raw(format!("{}{}. {}{}", cursor, i + 1, answer.text, tick))];
            if !answer.markings.is_empty() {
                spans.push(Span::styled(
                    format!("  [{}]", answer.markings.join(", ")),
                    Style::default().fg(Color::DarkGray),
                ));
            }

            let style = match answer.mark {
                AnswerMark::Correct => Style::default().fg(Color::Green),
                AnswerMark::Wrong => Style::default().fg(Color::Red),
                AnswerMark::Neutral => Style::default().fg(Color::White),
            };
            let style = if i == selected {
                style.add_modifier(Modifier::BOLD)
            } else {
                style
            };

            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Answers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(list, area);
}

fn render_standings(frame: &mut Frame, area: Rect, view: &SyncView) {
    let rows = standings(&view.snapshot.players);

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let filled = (row.ratio * BAR_WIDTH as f64).round() as usize;
            let gained = (row.last_ratio * BAR_WIDTH as f64).round() as usize;
            let base = filled.saturating_sub(gained);

            let style = if row.score.player == view.user {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>2}. {:<16} {:>5} ", row.rank, row.score.player, row.score.points),
                    style,
                ),
                Span::styled("█".repeat(base), Style::default().fg(Color::Cyan)),
                Span::styled(
                    "█".repeat(filled - base),
                    Style::default().fg(Color::LightGreen),
                ),
                Span::styled(
                    format!(" {}/{}", row.score.correct, row.score.answers_given),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Standings ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(list, area);
}

fn render_status(frame: &mut Frame, area: Rect, view: &SyncView) {
    let color = match view.status {
        SyncStatus::Synced => Color::Green,
        SyncStatus::Connecting => Color::Yellow,
        SyncStatus::Disconnected => Color::Red,
    };

    let latency = view
        .latency_ms
        .map(|ms| format!("{}ms", ms))
        .unwrap_or_else(|| "-".to_string());

    let line = Line::from(vec![
        Span::styled(format!("{:?}", view.status), Style::default().fg(color)),
        Span::styled(
            format!(
                "  {}  latency {}  offset {}ms  ↑↓ Select  Enter/1-9 Answer  Q Quit",
                view.user, latency, view.offset_ms
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
