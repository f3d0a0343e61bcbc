//! Input line
//!
//! Displays the compose buffer with cursor, or a placeholder while the
//! session cannot send.

use palaver_app::ChatScreen;
use palaver_client::{ChatView, MAX_MESSAGE_CHARS};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

const PROMPT_WIDTH: u16 = 3; // "> " inside left border
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the input line.
pub fn render(frame: &mut Frame, view: &ChatView, screen: &ChatScreen, area: Rect) {
    let count = screen.input().chars().count();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Esc to leave ")
        .title_bottom(format!(" {count}/{MAX_MESSAGE_CHARS} "));

    if !view.can_compose() {
        let paragraph = Paragraph::new("  Waiting for connection...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    // Keep the cursor visible on long input by scrolling horizontally.
    let available_width = usize::from(area.width.saturating_sub(PROMPT_WIDTH + RIGHT_PADDING));
    let skip = screen.cursor().saturating_sub(available_width);
    let visible: String = screen.input().chars().skip(skip).collect();

    let paragraph = Paragraph::new(format!("> {visible}"))
        .style(Style::default().fg(Color::White))
        .block(block);
    frame.render_widget(paragraph, area);

    let cursor_offset = u16::try_from(screen.cursor() - skip).unwrap_or(u16::MAX);
    let cursor_x = area.x.saturating_add(PROMPT_WIDTH).saturating_add(cursor_offset);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);

    frame.set_cursor_position((cursor_x.min(max_x), cursor_y));
}
