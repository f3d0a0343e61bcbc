//! Status bar
//!
//! Displays connection status, identity, and the latest notice.

use palaver_app::ChatScreen;
use palaver_client::{ChatView, ConnectionStatus};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render(frame: &mut Frame, view: &ChatView, screen: &ChatScreen, area: Rect) {
    let connection_status = match &view.status {
        ConnectionStatus::Connecting => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        ConnectionStatus::Connected => Span::styled(
            "Connected",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        ConnectionStatus::Disconnected => {
            Span::styled("Disconnected", Style::default().fg(Color::Red))
        },
        ConnectionStatus::Failed(reason) => Span::styled(
            format!("Failed: {reason}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };

    let info = format!(" | {} | Messages: {}", view.display_name, view.messages.len());

    let mut spans = vec![
        Span::raw(" "),
        connection_status,
        Span::styled(info, Style::default().fg(Color::Gray)),
    ];

    if let Some(notice) = screen.notice() {
        let color = if notice.is_error() { Color::Red } else { Color::Yellow };
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(notice.text().to_owned(), Style::default().fg(color)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
