//! Linearization of a conversation tree into Markdown transcript lines.

use crate::error::Result;
use crate::model::{Mapping, Part, Role};
use crate::tools::ToolRegistry;
use crate::tree::{self, DEFAULT_MAX_DEPTH};

/// Part `content_type` values that mark a conversation as a voice session.
pub const VOICE_CONTENT_TYPES: &[&str] = &[
    "audio_transcription",
    "real_time_user_audio_video_asset_pointer",
];

/// Ordered transcript of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    /// Heading lines (`## <emoji><role>\n<text>`) and continuation lines
    /// (`<emoji><text>`) in traversal order.
    pub lines: Vec<String>,
    /// Some part anywhere in the tree was an audio transcription.
    pub is_voice: bool,
    /// Some tool part was rendered by a registered formatter.
    pub tool_processed: bool,
}

impl Transcript {
    /// The Markdown body written to disk.
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}

/// Walks a conversation tree and renders every visible message.
#[derive(Debug, Clone)]
pub struct Linearizer<'r> {
    tools: &'r ToolRegistry,
    max_depth: usize,
}

impl<'r> Linearizer<'r> {
    pub fn new(tools: &'r ToolRegistry) -> Self {
        Self {
            tools,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Render the tree under `root` in depth-first pre-order.
    ///
    /// Consecutive messages from the same speaker along a branch share one
    /// heading; later ones become continuation lines. System messages are
    /// never rendered and do not interrupt a speaker run. A child inherits
    /// the last speaker of its parent, not of its preceding sibling.
    pub fn linearize(&self, root: &str, mapping: &Mapping) -> Result<Transcript> {
        let mut out = Transcript::default();

        tree::walk(root, mapping, self.max_depth, None::<Role>, |node, last_speaker| {
            let Some(message) = &node.message else {
                return last_speaker.clone();
            };
            let Some(parts) = message.parts() else {
                return last_speaker.clone();
            };
            let role = message.role();

            let mut text = String::new();
            let mut timestamp: Option<String> = None;

            for part in parts {
                match part {
                    Part::Text(raw) => text.push_str(raw),
                    Part::Structured(part) => {
                        if let Some(part_text) = &part.text {
                            text.push_str(part_text);
                        } else if *role == Role::Tool {
                            let output = self.tools.render(part.name.as_deref(), part.content.as_ref());
                            out.tool_processed |= output.formatted;
                            text.push_str(&output.text);
                        }

                        if part
                            .content_type
                            .as_deref()
                            .is_some_and(|ct| VOICE_CONTENT_TYPES.contains(&ct))
                        {
                            out.is_voice = true;
                        }
                        if let Some(timing) = part.timing {
                            timestamp = Some(format_duration(timing.duration_secs()));
                        }
                    }
                    Part::Other(_) => {}
                }
            }

            if text.is_empty() || *role == Role::System {
                return last_speaker.clone();
            }

            if let Some(ts) = timestamp
                && out.is_voice
            {
                text.push_str(&format!(" [{ts}]"));
            }

            let emoji = role.emoji();
            let line = if last_speaker.as_ref() == Some(role) {
                format!("{emoji}{text}")
            } else {
                format!("## {emoji}{role}\n{text}")
            };
            out.lines.push(line);

            Some(role.clone())
        })?;

        Ok(out)
    }
}

/// `M:SS` rendering of a duration in whole seconds.
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
