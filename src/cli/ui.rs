use super::app::BrowserApp;
use dayledger::navigator::{DayView, StepDirection};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::time::Instant;

pub fn draw(f: &mut Frame, app: &mut BrowserApp) {
    let input_height = if app.input.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),            // Date header
                Constraint::Min(4),               // Notes
                Constraint::Percentage(35),       // Spending
                Constraint::Length(input_height), // Input line when open
                Constraint::Length(1),            // Status
            ]
            .as_ref(),
        )
        .split(f.area());

    // Date header with flip indicator and navigable bounds
    let bounds = app.navigator.bounds();
    let date = app.navigator.current_date();
    let flip = app.navigator.flip_feedback(Instant::now());
    let marker = |dir| {
        let style = if flip == Some(dir) {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let glyph = match dir {
            StepDirection::Back => " ◀ ",
            StepDirection::Forward => " ▶ ",
        };
        Span::styled(glyph, style)
    };

    let header = Paragraph::new(Line::from(vec![
        marker(StepDirection::Back),
        Span::styled(
            date.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        marker(StepDirection::Forward),
        Span::styled(
            format!("  [{} .. {}]", bounds.min(), bounds.max()),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Day "));
    f.render_widget(header, chunks[0]);

    // Notes
    let notes_lines: Vec<Line> = match app.navigator.view() {
        DayView::Loading => vec![Line::from(Span::styled(
            "Loading...",
            Style::default().fg(Color::DarkGray),
        ))],
        DayView::Loaded(draft) if draft.notes.is_empty() => vec![Line::from(Span::styled(
            "(no notes)",
            Style::default().fg(Color::DarkGray),
        ))],
        DayView::Loaded(draft) => draft
            .notes
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect(),
        DayView::Unavailable(message) => vec![Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ))],
    };
    let notes = Paragraph::new(notes_lines)
        .block(Block::default().borders(Borders::ALL).title(" Notes "));
    f.render_widget(notes, chunks[1]);

    // Spending
    let (items, total): (Vec<ListItem>, f64) = match app.navigator.view() {
        DayView::Loaded(draft) => (
            draft
                .spent_items
                .iter()
                .map(|item| {
                    ListItem::new(Line::from(vec![
                        Span::raw(item.description.clone()),
                        Span::styled(
                            format!("  {:.2}", item.amount),
                            Style::default().fg(Color::Green),
                        ),
                    ]))
                })
                .collect(),
            draft.total_spent(),
        ),
        _ => (Vec::new(), 0.0),
    };
    let spent = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Spent ({total:.2}) ")),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol(">> ");
    let mut spent_state = ListState::default();
    spent_state.select(app.selected_item);
    f.render_stateful_widget(spent, chunks[2], &mut spent_state);

    // Input line
    if let Some((_, textarea)) = &app.input {
        f.render_widget(textarea, chunks[3]);
    }

    // Status / key hints
    let status = match &app.status {
        Some(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            " ←/→: navigate | g: jump | a: note | s: spend | ↑/↓: select | x: remove item | d: delete day | r: reload | q: quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(status), chunks[4]);
}
