use anyhow::{Context, Result};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

/// Read the payload from `file`, or from stdin when it is piped.
///
/// The payload is opaque: nothing is trimmed or validated. An interactive
/// stdin with no file gives an empty payload.
pub fn load_payload(file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload from {}", path.display()));
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }

    let mut payload = String::new();
    stdin
        .lock()
        .read_to_string(&mut payload)
        .context("Failed to read payload from stdin")?;
    Ok(payload)
}

/// Text shown on the page for a payload. JSON is pretty-printed, anything
/// else is shown as is.
pub fn display_text(payload: &str) -> String {
    if payload.trim().is_empty() {
        return "(no payload)".to_string();
    }

    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| payload.to_string()),
        Err(_) => payload.to_string(),
    }
}
