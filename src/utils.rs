use chrono::{DateTime, Local, NaiveDateTime};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::index::INDEX_FILE_NAME;

/// `created`/`modified` format used in front-matter and the index.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

const INVALID_TITLE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '\n', '\t'];

/// Configuration required to run the export process.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub use_date_folders: bool,
    pub max_depth: usize,
    pub force: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl ExportConfig {
    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(INDEX_FILE_NAME)
    }

    /// `<out>/<YYYY>/<yyMM>00` with date folders, `<out>` otherwise.
    pub fn conversation_dir(&self, created: &NaiveDateTime) -> PathBuf {
        if self.use_date_folders {
            self.output_dir
                .join(created.format("%Y").to_string())
                .join(format!("{}00", created.format("%y%m")))
        } else {
            self.output_dir.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    Created,
    Updated,
    Skipped,
}

/// Strip characters that are not allowed in file names. Titles that are
/// missing, or blank once stripped, become `noname`.
pub fn sanitize_title(title: Option<&str>) -> String {
    let cleaned = title.unwrap_or_default().replace(INVALID_TITLE_CHARS, "");
    if cleaned.trim().is_empty() {
        "noname".to_string()
    } else {
        cleaned
    }
}

/// Epoch seconds → local wall-clock time.
pub fn local_datetime(epoch_secs: f64) -> Option<NaiveDateTime> {
    if !epoch_secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp(epoch_secs.floor() as i64, 0)
        .map(|utc| utc.with_timezone(&Local).naive_local())
}

/// Hex SHA-256 of the transcript body, used for change detection.
pub fn hash_content(body: &str) -> String {
    format!("{:x}", Sha256::digest(body.as_bytes()))
}

/// The title portion of a file stem (`<yyMMdd-HHmm> <title>`).
pub fn stem_title(stem: &str) -> &str {
    stem.split_once(' ').map(|(_, title)| title).unwrap_or(stem)
}

/// Hands out `<yyMMdd-HHmm> <title>` stems, unique per directory within one run.
#[derive(Debug, Default)]
pub struct StemAllocator {
    claimed: HashSet<PathBuf>,
}

impl StemAllocator {
    pub fn allocate(&mut self, dir: &Path, created: &NaiveDateTime, title: &str) -> String {
        let base = format!("{} {}", created.format("%y%m%d-%H%M"), title);
        let mut stem = base.clone();
        let mut n = 2;
        while !self.claimed.insert(dir.join(&stem)) {
            stem = format!("{base} ({n})");
            n += 1;
        }
        stem
    }
}
