//! Type definitions for the ChatGPT `conversations.json` export.
//!
//! The export is a JSON array of conversation records. Each record carries a
//! `mapping` table from node id to node; nodes link to each other through
//! `parent` and `children`, forming a tree rooted at the single parentless
//! node (conventionally a message-less `client-created-root`).
//!
//! ```json
//! {
//!   "title": "Rust lifetimes",
//!   "create_time": 1700000000.123,
//!   "update_time": 1700000300.5,
//!   "mapping": {
//!     "root": { "message": null, "parent": null, "children": ["a"] },
//!     "a": {
//!       "message": {
//!         "author": { "role": "user" },
//!         "content": { "content_type": "text", "parts": ["Hi"] }
//!       },
//!       "parent": "root",
//!       "children": []
//!     }
//!   }
//! }
//! ```
//!
//! Only the fields the exporter reads are modelled; everything else in the
//! export is ignored during deserialization.
use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Node id → node table for one conversation.
pub type Mapping = HashMap<String, Node>;

/// One top-level entry of `conversations.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub title: Option<String>,
    /// Epoch seconds, usually fractional.
    pub create_time: f64,
    #[serde(default)]
    pub update_time: Option<f64>,
    pub mapping: Mapping,
}

/// A vertex of the conversation tree.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub author: Author,
    #[serde(default)]
    pub content: Option<Content>,
}

impl Message {
    /// The content parts, if the message carries any.
    pub fn parts(&self) -> Option<&[Part]> {
        self.content.as_ref()?.parts.as_deref()
    }

    pub fn role(&self) -> &Role {
        &self.author.role
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Option<Vec<Part>>,
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Author role of a message. Unknown roles are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::Other(name) => name,
        }
    }

    /// Marker placed before the role name in headings and continuation lines.
    pub fn emoji(&self) -> &'static str {
        match self {
            Role::User => "👤 ",
            Role::Assistant => "🤖 ",
            Role::Tool => "🛠️ ",
            Role::System | Role::Other(_) => "",
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "tool" => Role::Tool,
            _ => Role::Other(value),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

/// One element of `content.parts`.
///
/// The export mixes bare strings with objects of many shapes (tool results,
/// audio transcriptions, asset pointers, browsing queries). The shape is
/// decided here, once, so traversal code never inspects raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// A bare string element.
    Text(String),
    /// A JSON object element.
    Structured(StructuredPart),
    /// Anything else (null, numbers, arrays). Contributes no text.
    Other(Value),
}

/// The fields of an object part that the exporter cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredPart {
    /// Non-empty `text`, stringified if it was not a JSON string.
    pub text: Option<String>,
    /// Non-empty tool name.
    pub name: Option<String>,
    /// Non-empty tool payload.
    pub content: Option<Value>,
    pub content_type: Option<String>,
    /// `start`/`end` offsets from `metadata`, or from
    /// `audio_asset_pointer.metadata` when `metadata` is unusable.
    pub timing: Option<Timing>,
    /// Whether the object has a `query` key (assistant browsing calls).
    pub has_query: bool,
}

/// Audio segment offsets, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub start: f64,
    pub end: f64,
}

impl Timing {
    /// Whole seconds between `start` and `end`, floored. Reversed offsets
    /// give zero.
    pub fn duration_secs(&self) -> u64 {
        (self.end - self.start).floor().max(0.0) as u64
    }
}

impl StructuredPart {
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let metadata = obj
            .get("metadata")
            .and_then(Value::as_object)
            .filter(|m| !m.is_empty())
            .or_else(|| {
                obj.get("audio_asset_pointer")
                    .and_then(|pointer| pointer.get("metadata"))
                    .and_then(Value::as_object)
            });

        let timing = metadata.and_then(|m| {
            Some(Timing {
                start: m.get("start")?.as_f64()?,
                end: m.get("end")?.as_f64()?,
            })
        });

        Self {
            text: obj.get("text").filter(|v| is_truthy(v)).map(stringify),
            name: obj.get("name").filter(|v| is_truthy(v)).map(stringify),
            content: obj.get("content").filter(|v| is_truthy(v)).cloned(),
            content_type: obj
                .get("content_type")
                .and_then(Value::as_str)
                .map(str::to_owned),
            timing,
            has_query: obj.contains_key("query"),
        }
    }
}

impl<'de> Deserialize<'de> for Part {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => Part::Text(text),
            Value::Object(obj) => Part::Structured(StructuredPart::from_object(&obj)),
            other => Part::Other(other),
        })
    }
}

/// Render a JSON value as text: strings verbatim, everything else as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Null, `false`, zero, and empty strings/arrays/objects count as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
