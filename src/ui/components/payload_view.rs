use crate::app::AppState;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph},
};

pub fn render(f: &mut Frame, state: &AppState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Payload ")
        .style(Style::default().bg(state.theme.background));

    let paragraph = Paragraph::new(state.payload_text.as_str())
        .block(block)
        .style(Style::default().fg(state.theme.foreground))
        .scroll((state.scroll, 0));

    f.render_widget(paragraph, area);
}
