use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "shelfsort",
    about = "Folder analyzer that sorts files into topic-based subfolders",
    version,
    long_about = "ShelfSort scans a folder, classifies each file into a topic\n\
                  category (offline rules, an AI endpoint, or interactive\n\
                  prompts) and proposes a reorganization into category\n\
                  subfolders with improved filenames.\n\n\
                  Nothing is moved unless you pass the destructive flags:\n\
                  organize runs as a dry-run preview by default."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Classify files through interactive prompts instead of rules
    #[arg(short, long, global = true)]
    pub interactive: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// AI classifier endpoint URL
    #[arg(long, global = true, env = "SHELFSORT_AI_ENDPOINT")]
    pub ai_endpoint: Option<String>,

    /// AI classifier API key
    #[arg(long, global = true, env = "SHELFSORT_AI_API_KEY", hide_env_values = true)]
    pub ai_api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a folder and show the proposed organization plan
    Analyze(AnalyzeArgs),

    /// Apply (or preview) the organization plan for a folder
    Organize(OrganizeArgs),

    /// Show the suggested folder structure as category -> file count
    Structure(StructureArgs),

    /// Show current settings
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write a default settings file if none exists
    #[arg(long)]
    pub init: bool,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Folder to analyze
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Show detailed file information
    #[arg(short, long)]
    pub detailed: bool,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Scan depth (1 = immediate files only)
    #[arg(long)]
    pub depth: Option<usize>,
}

#[derive(Args, Debug)]
pub struct OrganizeArgs {
    /// Folder to organize
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Create the category folders
    #[arg(long)]
    pub create_folders: bool,

    /// Move files into their category folders (requires --create-folders)
    #[arg(long, requires = "create_folders")]
    pub move_files: bool,

    /// Rename files to their suggested names while moving
    #[arg(long)]
    pub apply_naming: bool,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct StructureArgs {
    /// Folder to inspect
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Print the structure as JSON
    #[arg(long)]
    pub json: bool,
}
