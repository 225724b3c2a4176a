use clap::{Parser, Subcommand};
use flowdoc::Editor;
use flowdoc::config::{self, EditorConfig};
use flowdoc::script::{parse_script, run_script};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flowdoc")]
#[command(about = "Replay edit scripts against a rich-text document", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an edit script and print the resulting document
    Replay {
        /// TOML file with [[step]] entries
        script: PathBuf,
        /// Undo every recorded action after the script ran
        #[arg(long)]
        undo_all: bool,
        /// Config file (defaults to the platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration as TOML
    Defaults,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let result = match args.command {
        Commands::Replay {
            script,
            undo_all,
            config,
        } => cmd_replay(&script, undo_all, config),
        Commands::Defaults => cmd_defaults(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_editor_config(path: Option<PathBuf>) -> EditorConfig {
    match path.or_else(config::config_file_path) {
        Some(path) => config::load_or_default(&path),
        None => EditorConfig::default(),
    }
}

fn cmd_replay(script_path: &Path, undo_all: bool, config: Option<PathBuf>) -> Result<(), String> {
    let source = fs::read_to_string(script_path)
        .map_err(|e| format!("Failed to read script '{}': {}", script_path.display(), e))?;
    let script = parse_script(&source)
        .map_err(|e| format!("Failed to parse script '{}': {}", script_path.display(), e))?;

    let mut editor = Editor::with_config(&load_editor_config(config));
    run_script(&mut editor, &script).map_err(|e| format!("Script failed: {}", e))?;
    if undo_all {
        while editor.undo().map_err(|e| format!("Undo failed: {}", e))? {}
    }

    let selection = editor.selection();
    print!("{}", editor.document());
    println!("selection: {}..{}", selection.start, selection.end);
    println!(
        "undo: {}  redo: {}",
        editor.undo_count(),
        editor.redo_count()
    );
    Ok(())
}

fn cmd_defaults() -> Result<(), String> {
    let toml = toml::to_string_pretty(&EditorConfig::default())
        .map_err(|e| format!("Failed to serialize defaults: {}", e))?;
    print!("{}", toml);
    Ok(())
}
