//! # Block identity encoding.
//!
//! Emitted blocks carry a synthetic name/instance that encodes where they came from:
//! ```text
//! name     = "app-<w>-<name>"
//! instance = "app-<w>-<i>-<instance>"
//!            │    │   │   └─ the block's own instance (may contain '-')
//!            │    │   └───── position in the widget's output
//!            │    └───────── widget index
//!            └────────────── fixed prefix
//! ```
//! Decoding reverses the mapping so a click can be routed back to the block.

use crate::error::RouteError;

const PREFIX: &str = "app";

/// Where an event points, plus the block's original identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub widget: usize,
    pub output: usize,
    pub name: String,
    pub instance: String,
}

pub fn encode_name(widget: usize, name: &str) -> String {
    format!("{PREFIX}-{widget}-{name}")
}

pub fn encode_instance(widget: usize, output: usize, instance: &str) -> String {
    format!("{PREFIX}-{widget}-{output}-{instance}")
}

fn index(value: &str, part: &str) -> Result<usize, RouteError> {
    part.parse().map_err(|source| RouteError::BadIndex {
        value: value.to_string(),
        source,
    })
}

/// Decodes an encoded name/instance pair, checking the widget index against `count`.
pub fn decode(name: &str, instance: &str, count: usize) -> Result<Identity, RouteError> {
    let name_parts: Vec<&str> = name.splitn(3, '-').collect();
    let inst_parts: Vec<&str> = instance.splitn(4, '-').collect();

    let (&[np, nw, orig_name], &[ip, iw, io, orig_instance]) =
        (name_parts.as_slice(), inst_parts.as_slice())
    else {
        let bad = if name_parts.len() != 3 { name } else { instance };
        return Err(RouteError::Malformed(bad.to_string()));
    };
    if np != PREFIX {
        return Err(RouteError::Malformed(name.to_string()));
    }
    if ip != PREFIX {
        return Err(RouteError::Malformed(instance.to_string()));
    }

    let widget = index(name, nw)?;
    let inst_widget = index(instance, iw)?;
    let output = index(instance, io)?;
    if widget != inst_widget {
        return Err(RouteError::Mismatch {
            name: widget,
            instance: inst_widget,
        });
    }
    if widget >= count {
        return Err(RouteError::UnknownWidget {
            index: widget,
            count,
        });
    }

    Ok(Identity {
        widget,
        output,
        name: orig_name.to_string(),
        instance: orig_instance.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identity_scenario() {
        assert_eq!(encode_name(0, ""), "app-0-");
        assert_eq!(encode_instance(0, 0, ""), "app-0-0-");
        let id = decode("app-0-", "app-0-0-", 1).unwrap();
        assert_eq!((id.widget, id.output), (0, 0));
        assert!(id.name.is_empty() && id.instance.is_empty());
    }

    #[test]
    fn original_parts_may_contain_dashes() {
        let n = encode_name(12, "cpu-load");
        let i = encode_instance(12, 3, "core-0-a");
        let id = decode(&n, &i, 13).unwrap();
        assert_eq!(
            id,
            Identity {
                widget: 12,
                output: 3,
                name: "cpu-load".into(),
                instance: "core-0-a".into(),
            }
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(decode("cpu", "app-0-0-", 1), Err(RouteError::Malformed(_))));
        assert!(matches!(decode("app-0-", "app-0-", 1), Err(RouteError::Malformed(_))));
        assert!(matches!(decode("bar-0-", "app-0-0-", 1), Err(RouteError::Malformed(_))));
        assert!(matches!(decode("app-x-", "app-x-0-", 1), Err(RouteError::BadIndex { .. })));
        assert!(matches!(decode("app-0-", "app-0-y-", 1), Err(RouteError::BadIndex { .. })));
        assert_eq!(
            decode("app-0-", "app-1-0-", 2),
            Err(RouteError::Mismatch { name: 0, instance: 1 })
        );
        assert_eq!(
            decode("app-5-", "app-5-0-", 2),
            Err(RouteError::UnknownWidget { index: 5, count: 2 })
        );
    }
}
