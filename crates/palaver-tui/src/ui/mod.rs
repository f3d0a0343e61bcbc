//! UI rendering
//!
//! Rendering functions that convert session and screen state into terminal
//! output using ratatui widgets. All functions are pure (no I/O), taking
//! state and returning widget trees.

mod chat;
mod input;
mod participants;
mod status;

use palaver_app::ChatScreen;
use palaver_client::ChatView;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Paragraph,
};

/// Render the entire UI.
pub fn render(frame: &mut Frame, view: &ChatView, screen: &ChatScreen) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const TYPING_HEIGHT: u16 = 1;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(TYPING_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, typing_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    render_main_area(frame, view, screen, *main_area);
    render_typing(frame, view, *typing_area);
    input::render(frame, view, screen, *input_area);
    status::render(frame, view, screen, *status_area);
}

/// Render the main area (chat + participants sidebar).
fn render_main_area(frame: &mut Frame, view: &ChatView, screen: &ChatScreen, area: Rect) {
    const SIDEBAR_WIDTH: u16 = 22;
    const CHAT_AREA_MIN_WIDTH: u16 = 20;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(CHAT_AREA_MIN_WIDTH), Constraint::Length(SIDEBAR_WIDTH)])
        .split(area);

    let [chat_area, sidebar_area] = chunks.as_ref() else {
        return;
    };

    chat::render(frame, view, screen, *chat_area);
    participants::render(frame, view, *sidebar_area);
}

fn render_typing(frame: &mut Frame, view: &ChatView, area: Rect) {
    let Some(banner) = view.typing_banner() else {
        return;
    };

    let style = Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);
    frame.render_widget(Paragraph::new(Span::styled(format!(" {banner}"), style)), area);
}
