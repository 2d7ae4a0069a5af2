use crate::analyzer::{self, ConversationStats};
use crate::document::{self, ConversationMeta};
use crate::index::{Index, IndexRow};
use crate::model::Conversation;
use crate::tools::ToolRegistry;
use crate::transcript::Linearizer;
use crate::tree;
use crate::utils::{
    ExportConfig, ProcessResult, StemAllocator, hash_content, local_datetime, sanitize_title,
    stem_title,
};
use eyre::{Context, Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use tracing::{debug, info, warn};

/// Outcome of one export run.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Statistics summed over every conversation that was processed.
    pub stats: ConversationStats,
}

impl ExportSummary {
    fn record(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Created => self.created += 1,
            ProcessResult::Updated => self.updated += 1,
            ProcessResult::Skipped => self.skipped += 1,
        }
    }
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Analysis Summary ===")?;
        writeln!(f, "Total Role Counts:")?;
        for (role, count) in &self.stats.roles {
            writeln!(f, "  {role}: {count}")?;
        }
        writeln!(f, "Total Tool Types:")?;
        for (tool, count) in &self.stats.tool_types {
            writeln!(f, "  {tool}: {count}")?;
        }
        writeln!(
            f,
            "Total Assistant JSON Instances: {}",
            self.stats.assistant_query_parts
        )?;
        write!(
            f,
            "Done. {} created, {} updated, {} skipped.",
            self.created, self.updated, self.skipped
        )?;
        if self.errors > 0 {
            write!(f, " Completed with {} error(s).", self.errors)?;
        }
        Ok(())
    }
}

/// The main entry point for the export logic.
/// Reads the export, writes one Markdown file per changed conversation, and
/// refreshes the index.
pub fn execute(config: &ExportConfig) -> Result<ExportSummary> {
    let raw = fs::read_to_string(&config.input)
        .wrap_err_with(|| format!("Failed to read input: {}", config.input.display()))?;
    let records: Vec<Value> = serde_json::from_str(&raw).wrap_err_with(|| {
        format!(
            "Input is not a JSON array of conversations: {}",
            config.input.display()
        )
    })?;
    drop(raw);

    fs::create_dir_all(&config.output_dir).wrap_err_with(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;

    let index_path = config.index_path();
    let mut index = Index::load(&index_path)?;
    debug!(rows = index.len(), path = %index_path.display(), "loaded index");

    let tools = ToolRegistry::default();
    let linearizer = Linearizer::new(&tools).with_max_depth(config.max_depth);
    let mut stems = StemAllocator::default();
    let mut summary = ExportSummary::default();

    let pb = make_bar(records.len() as u64, config.quiet);

    for (position, record) in records.into_iter().enumerate() {
        let label = record
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("#{position}"));

        match export_conversation(record, config, &linearizer, &mut index, &mut stems, &pb) {
            Ok((result, stats)) => {
                summary.record(result);
                summary.stats.merge(&stats);
            }
            Err(e) => {
                summary.errors += 1;
                warn!(conversation = %label, "skipping conversation: {e:#}");
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    if summary.created + summary.updated > 0 {
        index.write(&index_path)?;
        info!(rows = index.len(), path = %index_path.display(), "index written");
    }

    Ok(summary)
}

fn make_bar(total: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
    ) {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar.println(format!("Found {} conversations.", total));
    bar
}

fn export_conversation(
    record: Value,
    config: &ExportConfig,
    linearizer: &Linearizer<'_>,
    index: &mut Index,
    stems: &mut StemAllocator,
    pb: &ProgressBar,
) -> Result<(ProcessResult, ConversationStats)> {
    let conversation: Conversation =
        serde_json::from_value(record).wrap_err("Malformed conversation record")?;
    let title = sanitize_title(conversation.title.as_deref());

    let root = tree::root_key(&conversation.mapping)?;
    let transcript = linearizer
        .linearize(root, &conversation.mapping)
        .wrap_err("Failed to linearize conversation")?;
    let stats = analyzer::analyze(&conversation.mapping, config.max_depth)
        .wrap_err("Failed to analyze conversation")?;
    let body = transcript.body();

    let created = local_datetime(conversation.create_time)
        .ok_or_else(|| eyre!("Invalid create_time: {}", conversation.create_time))?;
    let modified = conversation
        .update_time
        .filter(|t| *t != 0.0)
        .and_then(local_datetime);

    let dir = config.conversation_dir(&created);
    fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("Failed to create directory: {}", dir.display()))?;
    let stem = stems.allocate(&dir, &created, &title);
    let path = dir.join(format!("{}.md", stem));

    if body.contains('{') {
        warn!(path = %path.display(), "possible JSON leftover in transcript");
    }

    let meta = ConversationMeta::extract(&title, created, modified, &body, transcript.is_voice);
    let content_hash = hash_content(&body);

    let result = match index.lookup(&meta.created, stem_title(&stem)) {
        None => ProcessResult::Created,
        Some(row) if row.content_hash != content_hash || config.force => ProcessResult::Updated,
        Some(_) => ProcessResult::Skipped,
    };

    if result == ProcessResult::Skipped {
        if config.verbose {
            pb.println(format!("Skipped:  {} (unchanged)", path.display()));
        }
        return Ok((result, stats));
    }

    let md_file = File::create(&path)
        .wrap_err_with(|| format!("Failed to create: {}", path.display()))?;
    let mut writer = BufWriter::new(md_file);
    document::write_document(&mut writer, &meta, &body)
        .wrap_err_with(|| format!("Failed to write: {}", path.display()))?;
    writer.flush().wrap_err("Failed to flush markdown file")?;
    drop(writer);

    index.upsert(IndexRow::new(&meta, &stem, &content_hash));

    if config.verbose {
        match result {
            ProcessResult::Created => pb.println(format!("Created:  {}", path.display())),
            ProcessResult::Updated => pb.println(format!("Updated:  {}", path.display())),
            ProcessResult::Skipped => {}
        }
    }

    Ok((result, stats))
}
