use serde::{Deserialize, Serialize};

/// How a process's stdout is turned into blocks.
///
/// - `Auto`: structured when the first JSON value is an object/array, text otherwise;
/// - `None`: output is discarded;
/// - `Text`: one block per line, never parsed as JSON;
/// - `Json`: structured; a first value that fails to decode is an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Auto,
    None,
    Text,
    Json,
}
