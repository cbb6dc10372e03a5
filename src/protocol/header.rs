//! # Protocol header.
//!
//! The first line of the stream. Decoding is strict (`deny_unknown_fields`)
//! so the executor can tell a header apart from other JSON objects.

use serde::{Deserialize, Serialize};

/// Protocol version written by the supervisor.
pub const PROTOCOL_VERSION: u32 = 1;

fn is_zero(v: &i32) -> bool {
    *v == 0
}

/// i3bar protocol header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Header {
    pub version: u32,
    /// Signal the bar sends to pause the producer (`0` = default SIGSTOP).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub stop_signal: i32,
    /// Signal the bar sends to resume the producer (`0` = default SIGCONT).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub cont_signal: i32,
    /// Whether click events will be written to the producer's stdin.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub click_events: bool,
}

impl Header {
    /// Header announcing click events and the given stop/continue signals.
    pub fn new(stop_signal: i32, cont_signal: i32) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            stop_signal,
            cont_signal,
            click_events: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_all_fields() {
        let h = Header::new(10, 18);
        assert_eq!(
            serde_json::to_string(&h).unwrap(),
            r#"{"version":1,"stop_signal":10,"cont_signal":18,"click_events":true}"#
        );
    }

    #[test]
    fn minimal_header_decodes() {
        let h: Header = serde_json::from_str(r#"{"version":1}"#).unwrap();
        assert_eq!(h.version, 1);
        assert!(!h.click_events);
        assert_eq!(h.stop_signal, 0);
    }

    #[test]
    fn unknown_fields_are_not_a_header() {
        assert!(serde_json::from_str::<Header>(r#"{"version":1,"full_text":"x"}"#).is_err());
        assert!(serde_json::from_str::<Header>(r#"{"full_text":"x"}"#).is_err());
    }
}
