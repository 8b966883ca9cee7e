use crate::app::AppState;
use crate::app::document::CONTROL_IDS;
use crate::dom::NodeId;
use crate::handler::CONFIRM_LABEL;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

const BUTTON_GAP: u16 = 2;

/// Draw the control row and return where each control ended up.
pub fn render(f: &mut Frame, state: &AppState, area: Rect) -> Vec<(NodeId, Rect)> {
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(state.theme.background));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut regions = Vec::new();
    let mut x = inner.x + 1;

    for (idx, id) in CONTROL_IDS.iter().enumerate() {
        let Some(node) = state.page.document().find_by_id(id) else {
            continue;
        };
        let label = state.control_label(id);
        let text = format!(" {label} ");
        let width = (text.width() as u16).min(inner.right().saturating_sub(x));
        if width == 0 || inner.height == 0 {
            break;
        }

        let mut style = Style::default()
            .fg(state.theme.button_fg)
            .bg(state.theme.button_bg);
        if label == CONFIRM_LABEL {
            style = style.fg(state.theme.confirm).add_modifier(Modifier::BOLD);
        }
        if idx == state.focus {
            style = style.fg(state.theme.focus).add_modifier(Modifier::REVERSED);
        }

        let rect = Rect::new(x, inner.y, width, 1);
        f.render_widget(Paragraph::new(text).style(style), rect);
        regions.push((node, rect));

        x = x.saturating_add(width + BUTTON_GAP);
    }

    regions
}
