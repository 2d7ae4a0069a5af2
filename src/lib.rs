//! # chatgpt-md-export
//!
//! Converts a ChatGPT data export (`conversations.json`) into one Markdown file
//! per conversation, plus a CSV index of everything exported.
//!
//! ## What it does
//!
//! Each conversation in the export is a tree of message nodes: edits and
//! regenerations branch off earlier messages. The tree is walked depth-first
//! and flattened into a transcript where consecutive messages from the same
//! speaker share one heading, tool results are rendered as Markdown, system
//! prompts are hidden, and voice conversations get segment timestamps.
//!
//! Every file starts with YAML frontmatter (title, dates, word and post
//! counts, voice flag). Files land in `<output>/<YYYY>/<yyMM>00/` unless date
//! folders are turned off.
//!
//! ## Incremental export
//!
//! `<output>/_index.csv` records a content hash per conversation. On repeated
//! runs, conversations whose transcript is unchanged are skipped; changed ones
//! are rewritten in place.
//!
//! ## Usage
//!
//! ```sh
//! # Export ./input/conversations.json into ./output
//! chatgpt-md-export
//!
//! # Explicit paths, flat layout
//! chatgpt-md-export ~/Downloads/conversations.json --output ~/notes/chatgpt --no-folders
//! ```
//!
//! Preferences can be persisted in `~/.config/chatgpt-md-export/config.toml`.
pub mod analyzer;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod index;
pub mod model;
pub mod tools;
pub mod transcript;
pub mod tree;
pub mod utils;

pub use analyzer::{ConversationStats, analyze};
pub use error::TreeError;
pub use tools::ToolRegistry;
pub use transcript::{Linearizer, Transcript};
