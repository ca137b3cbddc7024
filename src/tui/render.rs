use std::borrow::Cow;

use super::config_view::SettingsViewState;
use super::state::{ProgressViewState, ReportViewState};
use crate::engine::collector::CollectProgress;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState},
    Frame,
};

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn draw_settings(f: &mut Frame, state: &SettingsViewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // banner / notice
            Constraint::Min(0),    // fields
            Constraint::Length(1), // edit error
            Constraint::Length(1), // help line
        ])
        .split(f.area());

    let banner = match &state.notice {
        Some(notice) => Line::from(vec![
            Span::styled(" Rejected: ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(notice.as_str(), Style::default().fg(Color::Red)),
        ]),
        None => Line::from(Span::raw(" Review the run settings, then press s to start.")),
    };
    let header = Paragraph::new(banner)
        .block(Block::default().borders(Borders::ALL).title(" Listing order check "));
    f.render_widget(header, chunks[0]);

    let rows: Vec<Row> = state
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let label_style = if field.is_override() {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            let value_str = if state.editing && i == state.selected_field {
                format!("{}\u{258f}", state.edit_buffer) // show cursor
            } else {
                field.value.clone()
            };
            let value_style = if i == state.selected_field {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(field.label).style(label_style),
                Cell::from(value_str).style(value_style),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(24), Constraint::Min(10)])
        .block(Block::default().borders(Borders::ALL).title(" Settings "))
        .row_highlight_style(Style::default().bg(Color::DarkGray));
    let mut table_state = TableState::default();
    table_state.select(Some(state.selected_field));
    f.render_stateful_widget(table, chunks[1], &mut table_state);

    if let Some(err) = &state.error {
        let line = Paragraph::new(format!(" {}", err)).style(Style::default().fg(Color::Red));
        f.render_widget(line, chunks[2]);
    }

    let help = if state.editing {
        " Enter: confirm | Esc: cancel | Type to edit "
    } else {
        " \u{2191}\u{2193}/jk: fields | Enter: edit | d: reset to default | s: start run | q/Esc: quit "
    };
    let help_line = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    f.render_widget(help_line, chunks[3]);
}

pub fn draw_progress(f: &mut Frame, state: &ProgressViewState, progress: &CollectProgress) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(f.area());

    let width = chunks[0].width.saturating_sub(4) as usize;
    let spinner = SPINNER_FRAMES[state.spinner_frame as usize % SPINNER_FRAMES.len()];
    let header = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", spinner), Style::default().fg(Color::Cyan)),
        Span::raw(truncate_with_ellipsis(&state.source_url, width.saturating_sub(16)).into_owned()),
        Span::styled(format!("  {}", state.elapsed()), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Collecting "));
    f.render_widget(header, chunks[0]);

    let ratio = if progress.target == 0 {
        0.0
    } else {
        (progress.collected as f64 / progress.target as f64).min(1.0)
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label(format!("{} / {}", progress.collected, progress.target));
    f.render_widget(gauge, chunks[1]);

    let mut lines = vec![
        Line::from(format!(" Page    : {}", progress.page)),
        Line::from(format!(" Status  : {}", progress.status)),
    ];
    if progress.dropped > 0 {
        lines.push(Line::from(Span::styled(
            format!(" Dropped : {} undated item(s)", progress.dropped),
            Style::default().fg(Color::Yellow),
        )));
    }
    f.render_widget(Paragraph::new(lines), chunks[2]);
}

pub fn draw_report(f: &mut Frame, state: &ReportViewState) {
    let payload = &state.payload;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    let (verdict, verdict_color) = if payload.passed {
        ("PASS", Color::Green)
    } else {
        ("FAIL", Color::Red)
    };
    let mut summary = vec![Line::from(vec![
        Span::styled(
            format!(" {} ", verdict),
            Style::default().fg(verdict_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {}/{} items  {} violation(s)  {:.2}s",
            payload.item_count, payload.target_count, payload.violation_count, payload.duration_seconds
        )),
    ])];
    if let Some(failure) = &payload.failure {
        summary.push(Line::from(Span::styled(
            format!(" {}", failure),
            Style::default().fg(Color::Yellow),
        )));
    }
    let header = Paragraph::new(summary).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Report: {} ", payload.config_snapshot.source_url)),
    );
    f.render_widget(header, chunks[0]);

    let title_w = (chunks[1].width as usize).saturating_sub(5 + 21 + 16 + 8).max(10);
    let rows: Vec<Row> = payload
        .rows
        .iter()
        .skip(state.scroll_offset)
        .map(|row| {
            let style = if row.is_violation {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(row.position.to_string()),
                Cell::from(truncate_with_ellipsis(&row.title, title_w).into_owned()),
                Cell::from(row.timestamp.clone()),
                Cell::from(row.relative_age_text.clone()),
            ])
            .style(style)
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Min(10),
            Constraint::Length(21),
            Constraint::Length(16),
        ],
    )
    .header(
        Row::new(vec!["#", "Title", "Timestamp", "Age"])
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(" Items "));
    f.render_widget(table, chunks[1]);

    let footer = Line::from(vec![
        Span::styled("  [r]", Style::default().fg(Color::Yellow)),
        Span::raw("un again  "),
        Span::styled("[q]", Style::default().fg(Color::Yellow)),
        Span::raw("uit  "),
        Span::styled("[j/k]", Style::default().fg(Color::Yellow)),
        Span::raw(" scroll  "),
        Span::styled("[g/G]", Style::default().fg(Color::Yellow)),
        Span::raw(" top/bottom  "),
    ]);
    f.render_widget(Paragraph::new(footer), chunks[2]);
}

pub(crate) fn truncate_with_ellipsis(s: &str, max_width: usize) -> Cow<'_, str> {
    let char_count = s.chars().count();
    if char_count <= max_width {
        Cow::Borrowed(s)
    } else if max_width <= 3 {
        Cow::Owned(".".repeat(max_width))
    } else {
        let end = s
            .char_indices()
            .nth(max_width - 3)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        Cow::Owned(format!("{}...", &s[..end]))
    }
}
