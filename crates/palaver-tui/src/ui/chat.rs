//! Chat area
//!
//! Displays the message log, newest at the bottom.

use chrono::Local;
use palaver_app::ChatScreen;
use palaver_client::{ChatView, Message};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const BORDER_SIZE: u16 = 2;
const OWN_LABEL: &str = "You";

/// Render the chat area.
pub fn render(frame: &mut Frame, view: &ChatView, screen: &ChatScreen, area: Rect) {
    let title = if screen.is_following() {
        " Chat ".to_owned()
    } else {
        format!(" Chat (scrolled back {}) ", screen.scroll())
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if view.messages.is_empty() {
        let placeholder = ListItem::new(Line::from(Span::styled(
            "No messages yet. Say hello!",
            Style::default().fg(Color::DarkGray),
        )));
        frame.render_widget(List::new(vec![placeholder]).block(block), area);
        return;
    }

    let visible_height = usize::from(area.height.saturating_sub(BORDER_SIZE));
    let total = view.messages.len();
    let back = screen.scroll().min(total.saturating_sub(visible_height));
    let end = total - back;
    let start = end.saturating_sub(visible_height);

    let items: Vec<ListItem> =
        view.messages[start..end].iter().map(|message| message_item(view, message)).collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn message_item<'a>(view: &ChatView, message: &'a Message) -> ListItem<'a> {
    let time = message.timestamp.with_timezone(&Local).format("%H:%M").to_string();
    let time = Span::styled(format!("{time} "), Style::default().fg(Color::DarkGray));

    if message.is_system() {
        return ListItem::new(Line::from(vec![
            time,
            Span::styled(
                message.content.as_str(),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]));
    }

    let (sender, style) = if view.is_own(message) {
        (OWN_LABEL, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    } else {
        (message.sender.as_str(), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    };

    ListItem::new(Line::from(vec![
        time,
        Span::styled(sender, style),
        Span::raw(": "),
        Span::raw(message.content.as_str()),
    ]))
}
