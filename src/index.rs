//! The `_index.csv` file kept next to the exported Markdown.
//!
//! One row per exported conversation. The index doubles as the change
//! detector: a conversation whose transcript hash matches its row is not
//! rewritten.

use eyre::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use crate::document::ConversationMeta;
use crate::utils::stem_title;

pub const INDEX_FILE_NAME: &str = "_index.csv";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    #[serde(rename = "Filename", default)]
    pub filename: String,
    #[serde(rename = "Created", default)]
    pub created: String,
    #[serde(rename = "Modified", default)]
    pub modified: String,
    #[serde(rename = "Word Count", default, deserialize_with = "lenient_count")]
    pub word_count: usize,
    #[serde(rename = "Char Count", default, deserialize_with = "lenient_count")]
    pub char_count: usize,
    #[serde(rename = "User Posts", default, deserialize_with = "lenient_count")]
    pub user_posts: usize,
    #[serde(rename = "Assistant Posts", default, deserialize_with = "lenient_count")]
    pub assistant_posts: usize,
    #[serde(rename = "Tool Posts", default, deserialize_with = "lenient_count")]
    pub tool_posts: usize,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "Voice", default)]
    pub voice: String,
    #[serde(rename = "content_hash", default)]
    pub content_hash: String,
}

/// Counts edited by hand may be blank or junk; those read as 0.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0))
}

impl IndexRow {
    pub fn new(meta: &ConversationMeta, stem: &str, content_hash: &str) -> Self {
        Self {
            filename: stem.to_string(),
            created: meta.created.clone(),
            modified: meta.modified.clone(),
            word_count: meta.word_count,
            char_count: meta.char_count,
            user_posts: meta.user_posts,
            assistant_posts: meta.assistant_posts,
            tool_posts: meta.tool_posts,
            status: meta.status.clone(),
            voice: if meta.voice { "voice" } else { "" }.to_string(),
            content_hash: content_hash.to_string(),
        }
    }

    /// `(Created, title)` lookup key.
    fn key(&self) -> (String, String) {
        (self.created.clone(), stem_title(&self.filename).to_string())
    }
}

#[derive(Debug, Default)]
pub struct Index {
    rows: Vec<IndexRow>,
    by_key: HashMap<(String, String), usize>,
}

impl Index {
    /// Read the index at `path`. A missing file is an empty index.
    pub fn load(path: &Path) -> Result<Self> {
        let mut index = Self::default();
        if !path.exists() {
            return Ok(index);
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .wrap_err_with(|| format!("Failed to open index: {}", path.display()))?;
        for row in reader.deserialize::<IndexRow>() {
            match row {
                Ok(row) => index.upsert(row),
                Err(e) => warn!("Skipping malformed row in {}: {e}", path.display()),
            }
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[IndexRow] {
        &self.rows
    }

    pub fn lookup(&self, created: &str, title: &str) -> Option<&IndexRow> {
        self.by_key
            .get(&(created.to_string(), title.to_string()))
            .map(|&i| &self.rows[i])
    }

    /// Insert `row`, replacing any row with the same created time and title.
    pub fn upsert(&mut self, row: IndexRow) {
        let key = row.key();
        match self.by_key.get(&key) {
            Some(&i) => self.rows[i] = row,
            None => {
                self.by_key.insert(key, self.rows.len());
                self.rows.push(row);
            }
        }
    }

    /// Write all rows to `path`, ordered by creation time.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut rows: Vec<&IndexRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| a.created.cmp(&b.created));

        let mut writer = csv::Writer::from_path(path)
            .wrap_err_with(|| format!("Failed to create index: {}", path.display()))?;
        for row in rows {
            writer.serialize(row).wrap_err("Failed to write index row")?;
        }
        writer.flush().wrap_err("Failed to flush index")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn row(stem: &str, created: &str, hash: &str) -> IndexRow {
        IndexRow {
            filename: stem.to_string(),
            created: created.to_string(),
            content_hash: hash.to_string(),
            ..IndexRow::default()
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = Index::load(&dir.path().join(INDEX_FILE_NAME)).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn upsert_replaces_same_key() {
        let mut index = Index::default();
        index.upsert(row("240101-1000 Chat", "2024-01-01 10:00", "a"));
        index.upsert(row("240101-1000 Chat", "2024-01-01 10:00", "b"));
        index.upsert(row("240101-1000 Other", "2024-01-01 10:00", "c"));
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.lookup("2024-01-01 10:00", "Chat").unwrap().content_hash,
            "b"
        );
        assert!(index.lookup("2024-01-01 10:01", "Chat").is_none());
    }

    #[test]
    fn writes_sorted_with_expected_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE_NAME);

        let mut index = Index::default();
        index.upsert(row("240301-0900 Later", "2024-03-01 09:00", "h2"));
        index.upsert(row("240101-0900 Earlier", "2024-01-01 09:00", "h1"));
        index.write(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Filename,Created,Modified,Word Count,Char Count,User Posts,Assistant Posts,Tool Posts,Status,Voice,content_hash"
        );
        assert!(lines.next().unwrap().starts_with("240101-0900 Earlier,"));
        assert!(lines.next().unwrap().starts_with("240301-0900 Later,"));

        let reloaded = Index::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.lookup("2024-03-01 09:00", "Later").unwrap().content_hash,
            "h2"
        );
    }

    #[test]
    fn loads_rows_missing_hash_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE_NAME);
        fs::write(
            &path,
            "Filename,Created,Modified,Word Count\n231104-0807 Chat,2023-11-04 08:07,,12\n",
        )
        .unwrap();

        let index = Index::load(&path).unwrap();
        let row = index.lookup("2023-11-04 08:07", "Chat").unwrap();
        assert_eq!(row.word_count, 12);
        assert_eq!(row.content_hash, "");
    }

    #[test]
    fn blank_or_edited_counts_read_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE_NAME);
        fs::write(
            &path,
            "Filename,Created,Modified,Word Count,Char Count,User Posts\n\
             231104-0807 Chat,2023-11-04 08:07,,\n\
             231105-0900 Notes,2023-11-05 09:00,, 7 ,n/a,2\n",
        )
        .unwrap();

        let index = Index::load(&path).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup("2023-11-04 08:07", "Chat").unwrap().word_count, 0);
        let notes = index.lookup("2023-11-05 09:00", "Notes").unwrap();
        assert_eq!(notes.word_count, 7);
        assert_eq!(notes.char_count, 0);
        assert_eq!(notes.user_posts, 2);
    }

    #[test]
    fn row_from_meta_maps_voice() {
        let meta = ConversationMeta {
            title: "Call".into(),
            created: "2024-01-01 10:00".into(),
            modified: String::new(),
            word_count: 3,
            char_count: 10,
            user_posts: 1,
            assistant_posts: 1,
            tool_posts: 0,
            status: String::new(),
            voice: true,
        };
        let row = IndexRow::new(&meta, "240101-1000 Call", "abc");
        assert_eq!(row.voice, "voice");
        assert_eq!(row.filename, "240101-1000 Call");
        assert_eq!(row.content_hash, "abc");
    }
}
