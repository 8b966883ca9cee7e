use super::document::{CONTROL_IDS, QUIT_CONTROL_ID};
use crate::dom::NodeId;
use crate::handler::{COPY_CONTROL_ID, PAYLOAD_ATTRIBUTE};
use crate::page::Page;
use crate::payload::display_text;
use crate::ui::theme::Theme;
use ratatui::layout::Rect;

pub struct AppState {
    pub page: Page,
    pub payload_text: String,
    pub focus: usize,
    pub scroll: u16,
    pub should_quit: bool,
    pub show_help: bool,
    pub theme: Theme,
    /// Screen areas of the controls from the last draw, used for mouse hits.
    pub hit_regions: Vec<(NodeId, Rect)>,
}

impl AppState {
    pub fn new(page: Page, theme: Theme) -> Self {
        let payload_text = page
            .document()
            .element_by_id(COPY_CONTROL_ID)
            .and_then(|control| control.attribute(PAYLOAD_ATTRIBUTE))
            .map(display_text)
            .unwrap_or_else(|| display_text(""));

        Self {
            page,
            payload_text,
            focus: 0,
            scroll: 0,
            should_quit: false,
            show_help: false,
            theme,
            hit_regions: Vec::new(),
        }
    }

    pub fn focused_id(&self) -> &'static str {
        CONTROL_IDS[self.focus]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % CONTROL_IDS.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + CONTROL_IDS.len() - 1) % CONTROL_IDS.len();
    }

    pub fn control_label(&self, id: &str) -> &str {
        self.page
            .document()
            .element_by_id(id)
            .map(|control| control.text.as_str())
            .unwrap_or_default()
    }

    pub fn payload_len(&self) -> usize {
        self.page
            .document()
            .element_by_id(COPY_CONTROL_ID)
            .and_then(|control| control.attribute(PAYLOAD_ATTRIBUTE))
            .map(str::len)
            .unwrap_or(0)
    }

    pub fn hit_test(&self, column: u16, row: u16) -> Option<NodeId> {
        self.hit_regions
            .iter()
            .find(|(_, r)| column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height)
            .map(|(node, _)| *node)
    }

    /// Deliver a click to the page. Every click goes through the page
    /// dispatcher, whether or not it landed on a control.
    pub fn click(&mut self, target: Option<NodeId>) {
        self.page.dispatch_click(target);

        let is_quit = target
            .and_then(|node| self.page.document().get(node))
            .is_some_and(|control| control.id == QUIT_CONTROL_ID);
        if is_quit {
            self.should_quit = true;
        }
    }

    pub fn click_by_id(&mut self, id: &str) {
        let target = self.page.document().find_by_id(id);
        self.click(target);
    }

    pub fn activate_focused(&mut self) {
        self.click_by_id(self.focused_id());
    }

    pub fn scroll_down(&mut self) {
        let max = self.payload_text.lines().count().saturating_sub(1) as u16;
        self.scroll = (self.scroll + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}
