use crate::dom::{Document, Element};
use crate::handler::{COPY_CONTROL_ID, IDLE_LABEL, PAYLOAD_ATTRIBUTE};

pub const QUIT_CONTROL_ID: &str = "quit";

/// Controls in focus order.
pub const CONTROL_IDS: [&str; 2] = [COPY_CONTROL_ID, QUIT_CONTROL_ID];

/// Build the page shown for `payload`: the copy control carrying the payload,
/// followed by a quit control.
pub fn build_document(payload: &str) -> Document {
    let mut doc = Document::new();
    doc.push(Element::new(COPY_CONTROL_ID, IDLE_LABEL).with_attribute(PAYLOAD_ATTRIBUTE, payload));
    doc.push(Element::new(QUIT_CONTROL_ID, "Quit"));
    doc
}
