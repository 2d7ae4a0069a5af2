use chatgpt_md_export::{config, export, tree::DEFAULT_MAX_DEPTH, utils::ExportConfig};
use clap::Parser;
use eyre::{Result, eyre};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Export ChatGPT conversation history to Markdown files.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to conversations.json from the ChatGPT data export.
    /// Defaults to ./input/conversations.json if not set in config.
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Directory to export markdown files and the index into.
    /// Defaults to ./output if not set in config.
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Store files in a single output directory instead of date folders.
    #[arg(long)]
    no_folders: bool,

    /// Maximum conversation tree depth before a conversation is rejected.
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/chatgpt-md-export/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Rewrite every conversation even if its content is unchanged.
    #[arg(short, long)]
    force: bool,

    /// Print each file written or skipped.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress standard output (progress bar and summary).
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // 1. Load config file (CLI path > default path)
    let file_cfg = config::load_file_config(cli.config.as_deref())?;

    // 2. Resolve input (CLI > Config > Default)
    let input = cli
        .input
        .or(file_cfg.input)
        .unwrap_or_else(|| PathBuf::from("input/conversations.json"));

    if !input.is_file() {
        return Err(eyre!(
            "Input not found at: {}\nPass the path to conversations.json or set input in config.toml.",
            input.display()
        ));
    }

    // 3. Resolve output_dir (CLI > Config > Default)
    let output_dir = cli
        .output
        .or(file_cfg.output_dir)
        .unwrap_or_else(|| PathBuf::from("output"));

    // 4. Resolve layout and depth (CLI > Config > Default)
    let use_date_folders = !cli.no_folders && file_cfg.use_date_folders.unwrap_or(true);
    let max_depth = cli
        .max_depth
        .or(file_cfg.max_depth)
        .unwrap_or(DEFAULT_MAX_DEPTH);

    // 5. Build the Export Config
    let config = ExportConfig {
        input,
        output_dir,
        use_date_folders,
        max_depth,
        force: cli.force,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    // 6. Run the Business Logic
    let summary = export::execute(&config)?;
    if !config.quiet {
        println!("{summary}");
    }
    Ok(())
}
