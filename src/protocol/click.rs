//! # Click events read from the bar.
//!
//! The bar writes an infinite JSON array, one event per line:
//! ```text
//! [
//! {"name":"app-0-","instance":"app-0-0-","button":1,...}
//! ,{"name":"app-2-cpu","instance":"app-2-1-","button":3,...}
//! ```
//! [`parse_line`] strips the array decoration before decoding.

use serde::{Deserialize, Serialize};

/// A user interaction addressed to one block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickEvent {
    pub name: String,
    pub instance: String,
    pub button: u32,
    pub x: i32,
    pub y: i32,
    pub relative_x: i32,
    pub relative_y: i32,
    pub output_x: i32,
    pub output_y: i32,
    pub width: i32,
    pub height: i32,
    /// Held modifiers, e.g. `Shift`, `Mod4`.
    pub modifiers: Vec<String>,
}

impl ClickEvent {
    /// Event fields as `I3_*` environment pairs for side-effect commands.
    pub fn env(&self) -> Vec<(String, String)> {
        vec![
            ("I3_NAME".into(), self.name.clone()),
            ("I3_INSTANCE".into(), self.instance.clone()),
            ("I3_BUTTON".into(), self.button.to_string()),
            ("I3_X".into(), self.x.to_string()),
            ("I3_Y".into(), self.y.to_string()),
            ("I3_RELATIVE_X".into(), self.relative_x.to_string()),
            ("I3_RELATIVE_Y".into(), self.relative_y.to_string()),
            ("I3_OUTPUT_X".into(), self.output_x.to_string()),
            ("I3_OUTPUT_Y".into(), self.output_y.to_string()),
            ("I3_WIDTH".into(), self.width.to_string()),
            ("I3_HEIGHT".into(), self.height.to_string()),
            ("I3_MODIFIERS".into(), self.modifiers.join(",")),
        ]
    }
}

/// Decodes one input line; `None` for lines that carry only decoration.
pub fn parse_line(line: &str) -> Option<Result<ClickEvent, serde_json::Error>> {
    let body = line.trim_matches(|c: char| c == '[' || c == ']' || c == ',' || c.is_whitespace());
    if body.is_empty() {
        return None;
    }
    Some(serde_json::from_str(body))
}
