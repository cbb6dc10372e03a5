//! # Block: one visible segment of the status line.
//!
//! A [`Block`] carries the fixed i3bar fields plus an open map of extension
//! fields ([`Block::custom`]). Only keys starting with `_` survive decoding;
//! they are written back alongside the fixed fields on output.
//!
//! ## Template overlay
//! ```text
//! template: {color:"#fff", separator:true, _icon:"x"}
//! incoming: {full_text:"12:00", color:"#0f0"}
//! overlay : {full_text:"12:00", color:"#0f0", separator:true, _icon:"x"}
//! ```
//! Fields present on the incoming block win; the template fills the rest.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Color used for every error block.
pub const ERROR_COLOR: &str = "#ff0000";

/// Prefix marking a block field as extension data.
pub const CUSTOM_PREFIX: char = '_';

/// `min_width` is either a pixel count or a sample text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinWidth {
    /// Width in pixels.
    Pixels(u32),
    /// Width of the given text.
    Text(String),
}

/// One segment of the bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Text to display.
    #[serde(default)]
    pub full_text: String,
    /// Text used when the bar runs out of space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_text: Option<String>,
    /// Foreground color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Background color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Border color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_top: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_right: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_bottom: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_left: Option<u32>,
    /// `pango` or `none`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<MinWidth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator_block_width: Option<u32>,
    /// Protocol identity; rewritten by the supervisor before emission.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Protocol identity; rewritten by the supervisor before emission.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance: String,
    /// Extension fields (`_`-prefixed keys).
    #[serde(flatten, deserialize_with = "custom_fields")]
    pub custom: BTreeMap<String, Value>,
}

fn custom_fields<'de, D>(d: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut map = BTreeMap::<String, Value>::deserialize(d)?;
    map.retain(|k, _| k.starts_with(CUSTOM_PREFIX));
    Ok(map)
}

impl Block {
    /// Plain text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            full_text: text.into(),
            ..Self::default()
        }
    }

    /// Red block used to surface failures on the bar.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            full_text: text.into(),
            color: Some(ERROR_COLOR.to_string()),
            ..Self::default()
        }
    }

    /// Returns this block with `template` supplying every field this block leaves unset.
    ///
    /// Custom maps are merged; on key collision this block's value wins.
    pub fn overlay(&self, template: &Block) -> Block {
        fn pick<T: Clone>(own: &Option<T>, tpl: &Option<T>) -> Option<T> {
            own.as_ref().or(tpl.as_ref()).cloned()
        }
        fn pick_str(own: &str, tpl: &str) -> String {
            if own.is_empty() { tpl } else { own }.to_string()
        }

        let mut custom = template.custom.clone();
        custom.extend(self.custom.iter().map(|(k, v)| (k.clone(), v.clone())));

        Block {
            full_text: pick_str(&self.full_text, &template.full_text),
            short_text: pick(&self.short_text, &template.short_text),
            color: pick(&self.color, &template.color),
            background: pick(&self.background, &template.background),
            border: pick(&self.border, &template.border),
            border_top: pick(&self.border_top, &template.border_top),
            border_right: pick(&self.border_right, &template.border_right),
            border_bottom: pick(&self.border_bottom, &template.border_bottom),
            border_left: pick(&self.border_left, &template.border_left),
            markup: pick(&self.markup, &template.markup),
            min_width: pick(&self.min_width, &template.min_width),
            align: pick(&self.align, &template.align),
            urgent: pick(&self.urgent, &template.urgent),
            separator: pick(&self.separator, &template.separator),
            separator_block_width: pick(
                &self.separator_block_width,
                &template.separator_block_width,
            ),
            name: pick_str(&self.name, &template.name),
            instance: pick_str(&self.instance, &template.instance),
            custom,
        }
    }

    /// Custom fields as `I3_<KEY>` environment pairs.
    ///
    /// String values are passed verbatim, anything else as its JSON text.
    pub fn custom_env(&self) -> Vec<(String, String)> {
        self.custom
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (format!("I3_{}", k.to_uppercase()), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_keeps_only_underscore_custom_fields() {
        let b: Block = serde_json::from_value(json!({
            "full_text": "x",
            "_id": 7,
            "unknown": true,
        }))
        .unwrap();
        assert_eq!(b.full_text, "x");
        assert_eq!(b.custom.len(), 1);
        assert_eq!(b.custom["_id"], json!(7));
    }

    #[test]
    fn encode_skips_unset_fields_and_inlines_custom() {
        let mut b = Block::text("hi");
        b.custom.insert("_tag".into(), json!("a"));
        let v = serde_json::to_value(&b).unwrap();
        assert_eq!(v, json!({"full_text": "hi", "_tag": "a"}));
    }

    #[test]
    fn min_width_accepts_number_or_text() {
        let a: Block = serde_json::from_str(r#"{"full_text":"","min_width":40}"#).unwrap();
        let b: Block = serde_json::from_str(r#"{"full_text":"","min_width":"00:00"}"#).unwrap();
        assert_eq!(a.min_width, Some(MinWidth::Pixels(40)));
        assert_eq!(b.min_width, Some(MinWidth::Text("00:00".into())));
    }

    #[test]
    fn overlay_prefers_incoming_fields() {
        let mut tpl = Block {
            color: Some("#ffffff".into()),
            separator: Some(true),
            separator_block_width: Some(21),
            ..Block::default()
        };
        tpl.custom.insert("_a".into(), json!(1));
        tpl.custom.insert("_b".into(), json!(1));

        let mut incoming = Block {
            full_text: "12:00".into(),
            color: Some("#00ff00".into()),
            separator: Some(false),
            ..Block::default()
        };
        incoming.custom.insert("_b".into(), json!(2));

        let out = incoming.overlay(&tpl);
        assert_eq!(out.full_text, "12:00");
        assert_eq!(out.color.as_deref(), Some("#00ff00"));
        assert_eq!(out.separator, Some(false));
        assert_eq!(out.separator_block_width, Some(21));
        assert_eq!(out.custom["_a"], json!(1));
        assert_eq!(out.custom["_b"], json!(2));
    }

    #[test]
    fn custom_env_uppercases_keys() {
        let mut b = Block::text("x");
        b.custom.insert("_host".into(), json!("srv"));
        b.custom.insert("_n".into(), json!(3));
        let env = b.custom_env();
        assert!(env.contains(&("I3__HOST".to_string(), "srv".to_string())));
        assert!(env.contains(&("I3__N".to_string(), "3".to_string())));
    }

    #[test]
    fn error_block_is_red() {
        let b = Block::error("boom");
        assert_eq!(b.full_text, "boom");
        assert_eq!(b.color.as_deref(), Some(ERROR_COLOR));
    }
}
