//! Participants sidebar
//!
//! Displays the latest roster, marking the local participant.

use palaver_client::ChatView;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const TYPING_MARKER: &str = " ...";

/// Render the participants sidebar.
pub fn render(frame: &mut Frame, view: &ChatView, area: Rect) {
    let items: Vec<ListItem> = view
        .participants
        .iter()
        .map(|name| {
            let is_self = name.as_str() == &*view.display_name;
            let is_typing = view.typing_users.iter().any(|t| t == name);

            let (label, style) = if is_self {
                (format!("{name} (you)"), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            } else {
                (name.clone(), Style::default())
            };

            let marker = if is_typing { TYPING_MARKER } else { "" };
            ListItem::new(Line::from(vec![
                Span::styled(label, style),
                Span::styled(marker, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let title = format!(" Online ({}) ", view.participants.len());
    let block = Block::default().borders(Borders::ALL).title(title);

    frame.render_widget(List::new(items).block(block), area);
}
