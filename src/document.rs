use chrono::NaiveDateTime;
use serde::Serialize;
use std::io::Write;

use crate::utils::DATE_FORMAT;

const USER_HEADING: &str = "## 👤 user";
const ASSISTANT_HEADING: &str = "## 🤖 assistant";
const TOOL_HEADING: &str = "## 🛠️ tool";

/// Per-conversation metadata, shared by the front-matter and the CSV index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMeta {
    pub title: String,
    pub created: String,
    pub modified: String,
    pub word_count: usize,
    pub char_count: usize,
    pub user_posts: usize,
    pub assistant_posts: usize,
    pub tool_posts: usize,
    pub status: String,
    pub voice: bool,
}

impl ConversationMeta {
    pub fn extract(
        title: &str,
        created: NaiveDateTime,
        modified: Option<NaiveDateTime>,
        body: &str,
        is_voice: bool,
    ) -> Self {
        Self {
            title: title.to_string(),
            created: created.format(DATE_FORMAT).to_string(),
            modified: modified
                .map(|m| m.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            word_count: body.split_whitespace().count(),
            char_count: body.chars().count(),
            user_posts: body.matches(USER_HEADING).count(),
            assistant_posts: body.matches(ASSISTANT_HEADING).count(),
            tool_posts: body.matches(TOOL_HEADING).count(),
            status: if title.contains('🚫') { "bad" } else { "" }.to_string(),
            voice: is_voice,
        }
    }
}

#[derive(Serialize)]
struct Frontmatter<'a> {
    title: &'a str,
    created: &'a str,
    modified: &'a str,
    word_count: usize,
    char_count: usize,
    user_posts: usize,
    assistant_posts: usize,
    tool_posts: usize,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_mode: Option<bool>,
}

impl<'a> From<&'a ConversationMeta> for Frontmatter<'a> {
    fn from(meta: &'a ConversationMeta) -> Self {
        Self {
            title: &meta.title,
            created: &meta.created,
            modified: &meta.modified,
            word_count: meta.word_count,
            char_count: meta.char_count,
            user_posts: meta.user_posts,
            assistant_posts: meta.assistant_posts,
            tool_posts: meta.tool_posts,
            status: &meta.status,
            voice_mode: meta.voice.then_some(true),
        }
    }
}

/// Write the YAML front-matter block followed by the transcript body.
pub fn write_document<W: Write>(
    writer: &mut W,
    meta: &ConversationMeta,
    body: &str,
) -> std::io::Result<()> {
    let yaml = serde_yaml::to_string(&Frontmatter::from(meta)).map_err(std::io::Error::other)?;

    writeln!(writer, "---")?;
    write!(writer, "{}", yaml)?;
    writeln!(writer, "---")?;
    writeln!(writer)?;
    write!(writer, "{}", body)?;

    Ok(())
}
