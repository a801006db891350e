use elusiv_demo_core::{AppState, BalanceView, Readiness, Workflow};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::tui::app::{
    App, balance_text, button_label, connection_text, phase_text, public_balance_text,
};
use crate::tui::theme::*;

pub fn render_ui(f: &mut Frame, app: &App) {
    draw(f, &app.state, &app.status_message);
}

fn draw(f: &mut Frame, state: &AppState, status_message: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    let header_color = match state.readiness {
        Readiness::Failed(_) => COLOR_ERROR,
        _ => COLOR_PRIMARY,
    };
    let header = Paragraph::new(format!(
        "  Elusiv Demo Wallet  │  {}",
        connection_text(state)
    ))
    .style(
        Style::default()
            .fg(header_color)
            .bg(COLOR_BG)
            .add_modifier(Modifier::BOLD),
    )
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(COLOR_BORDER).bg(COLOR_BG)),
    );
    f.render_widget(header, chunks[0]);

    let wallet = Paragraph::new(wallet_lines(state))
        .style(Style::default().fg(COLOR_TEXT).bg(COLOR_BG))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(" Wallet ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(COLOR_BORDER).bg(COLOR_BG)),
        );
    f.render_widget(wallet, chunks[1]);

    let status_width = if !status_message.is_empty() {
        (status_message.len() + 4).min(48)
    } else {
        15
    };
    let footer_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(status_width as u16)])
        .split(chunks[2]);

    let footer_left =
        Paragraph::new("  [t] Top-up  │  [s] Send  │  [r] Refresh  │  [q] Quit")
            .style(Style::default().fg(COLOR_TEXT).bg(COLOR_BG))
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(COLOR_BORDER).bg(COLOR_BG)),
            );
    f.render_widget(footer_left, footer_chunks[0]);

    let status_text = if !status_message.is_empty() {
        format!(" {status_message} ")
    } else {
        " Ready ".to_string()
    };
    let footer_right = Paragraph::new(status_text)
        .style(Style::default().fg(COLOR_SUCCESS).bg(COLOR_BG))
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(COLOR_BORDER).bg(COLOR_BG)),
        );
    f.render_widget(footer_right, footer_chunks[1]);
}

fn wallet_lines(state: &AppState) -> Vec<Line<'static>> {
    let label = Style::default().fg(COLOR_PRIMARY);
    let owner = state
        .owner
        .map(|o| o.to_string())
        .unwrap_or_else(|| "-".to_string());
    let balance_color = match (&state.readiness, &state.balance) {
        (Readiness::Failed(_), _) | (_, BalanceView::Failed(_)) => COLOR_ERROR,
        (_, BalanceView::Known(_)) => COLOR_SUCCESS,
        (_, BalanceView::Fetching) => COLOR_WARNING,
    };

    let mut lines = vec![
        Line::from(vec![Span::styled("Owner: ", label), Span::raw(owner)]),
        Line::from(vec![
            Span::styled("Private Balance: ", label),
            Span::styled(
                balance_text(state),
                Style::default()
                    .fg(balance_color)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Public Balance: ", label),
            Span::raw(public_balance_text(state)),
        ]),
        Line::from(""),
        Line::from(vec![
            button(
                button_label(Workflow::TopUp, &state.top_up),
                state.top_up_enabled(),
            ),
            Span::raw("   "),
            button(
                button_label(Workflow::Send, &state.send),
                state.send_enabled(),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Top-up: ", label),
            Span::raw(phase_text(&state.top_up)),
        ]),
        Line::from(vec![
            Span::styled("Send:   ", label),
            Span::raw(phase_text(&state.send)),
        ]),
    ];

    if state.is_ready() {
        if let Some(reason) = state.send_blocker() {
            lines.push(Line::styled(
                format!("Send disabled: {reason}"),
                Style::default().fg(COLOR_DISABLED),
            ));
        }
    }

    lines.push(Line::from(""));
    if let Some(notice) = &state.notice {
        lines.push(Line::styled(
            notice.clone(),
            Style::default().fg(COLOR_SUCCESS),
        ));
    }
    if let Some(error) = &state.last_error {
        lines.push(Line::styled(
            format!("Error: {error}"),
            Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
        ));
    }
    lines
}

fn button(label: &str, enabled: bool) -> Span<'static> {
    let style = if enabled {
        Style::default()
            .fg(COLOR_BG)
            .bg(COLOR_PRIMARY)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(COLOR_DISABLED)
            .add_modifier(Modifier::DIM)
    };
    Span::styled(format!("[ {label} ]"), style)
}
