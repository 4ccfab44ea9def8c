//! CLI argument parsing for promptbatch.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use promptbatch::project::DEFAULT_PROJECT_FILE;
use std::path::PathBuf;

/// Promptbatch: run batches of templated prompts against a generative model.
///
/// A project file holds:
/// - Variables, referenced from any text as `{NAME}` and resolved recursively
/// - An ordered list of tasks, each a prompt plus an output template
/// - Run settings (model, output folder, extension, log folder)
///
/// `run` sends every enabled task's prompt in order and writes one output
/// file per task.
#[derive(Parser, Debug)]
#[command(name = "promptbatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the project file.
    #[arg(
        long,
        short = 'p',
        global = true,
        env = "PROMPTBATCH_PROJECT",
        default_value = DEFAULT_PROJECT_FILE
    )]
    pub project: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for promptbatch.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty project file if none exists.
    Init,

    /// Manage variables.
    #[command(subcommand)]
    Var(VarCommand),

    /// Manage tasks.
    #[command(subcommand)]
    Task(TaskCommand),

    /// Preview how a piece of text resolves against the project's variables.
    ///
    /// Unknown placeholders are left as-is and listed on stderr.
    Resolve(ResolveArgs),

    /// Execute all enabled tasks in order.
    ///
    /// Stops at the first failing task. Ctrl-C stops the run after the
    /// current task; a second Ctrl-C aborts. Use `--dry-run` to preview
    /// resolved prompts without calling the API.
    Run(RunArgs),

    /// Manage server-side cached content.
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Inspect run logs.
    #[command(subcommand)]
    Log(LogCommand),
}

// ============================================================================
// Variables
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum VarCommand {
    /// List variables in order.
    List(VarListArgs),

    /// Add a variable. The name is made unique if it is taken.
    Add(VarAddArgs),

    /// Rename a variable.
    Rename(RenameArgs),

    /// Replace a variable's value.
    Set(VarSetArgs),

    /// Replace a variable's value with a file's contents.
    Load(VarLoadArgs),

    /// Remove a variable.
    Rm(NameArgs),
}

#[derive(Args, Debug)]
pub struct VarListArgs {
    /// Print values in full instead of a one-line preview.
    #[arg(long)]
    pub values: bool,
}

#[derive(Args, Debug)]
pub struct VarAddArgs {
    /// Variable name (defaults to "new variable").
    pub name: Option<String>,

    /// Initial value.
    #[arg(long, default_value = "")]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct VarSetArgs {
    pub name: String,
    pub value: String,
}

#[derive(Args, Debug)]
pub struct VarLoadArgs {
    pub name: String,

    /// UTF-8 text file to read.
    pub file: PathBuf,
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// List tasks in execution order.
    List,

    /// Append a task. The name is made unique if it is taken.
    Add(TaskAddArgs),

    /// Duplicate a task; the copy is inserted right after it.
    Copy(NameArgs),

    /// Rename a task.
    Rename(RenameArgs),

    /// Replace a task's prompt.
    Prompt(TaskTextArgs),

    /// Replace a task's output template. Empty means the raw response.
    Template(TaskTextArgs),

    /// Remove a task.
    Rm(NameArgs),

    /// Move a task one position earlier.
    Up(NameArgs),

    /// Move a task one position later.
    Down(NameArgs),

    /// Include a task in runs.
    Enable(NameArgs),

    /// Exclude a task from runs.
    Disable(NameArgs),

    /// Enable every task.
    EnableAll,

    /// Disable every task.
    DisableAll,
}

#[derive(Args, Debug)]
pub struct TaskAddArgs {
    /// Task name (defaults to "new task").
    pub name: Option<String>,

    /// Prompt text.
    #[arg(long, default_value = "")]
    pub prompt: String,

    /// Read the prompt from a file instead.
    #[arg(long, conflicts_with = "prompt")]
    pub prompt_file: Option<PathBuf>,

    /// Output template; `{RESPONSE}` is replaced by the model response.
    #[arg(long)]
    pub template: Option<String>,

    /// Add the task disabled.
    #[arg(long)]
    pub disabled: bool,
}

#[derive(Args, Debug)]
pub struct TaskTextArgs {
    pub name: String,

    /// New text.
    #[arg(required_unless_present = "file")]
    pub text: Option<String>,

    /// Read the new text from a file.
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

// ============================================================================
// Shared argument shapes
// ============================================================================

#[derive(Args, Debug)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    pub name: String,
    pub new_name: String,
}

// ============================================================================
// Resolve / Run
// ============================================================================

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Text containing `{NAME}` placeholders.
    pub text: String,

    /// Value bound to `{RESPONSE}` for previewing output templates.
    #[arg(long)]
    pub response: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Model to use instead of the project setting.
    #[arg(long)]
    pub model: Option<String>,

    /// Output folder instead of the project setting.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output file extension instead of the project setting.
    #[arg(long)]
    pub ext: Option<String>,

    /// Run log folder instead of the project setting.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Cached content name to attach to every request.
    #[arg(long)]
    pub cache: Option<String>,

    /// Write resolved prompts instead of calling the API.
    #[arg(long)]
    pub dry_run: bool,

    /// Print run events as JSON lines on stdout.
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// Cache / Log
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// List cached contents.
    List,

    /// Show one cached content.
    Show(CacheNameArgs),

    /// Create a cached content from a text file.
    Create(CacheCreateArgs),

    /// Change a cached content's time to live.
    Ttl(CacheTtlArgs),

    /// Delete a cached content.
    Rm(CacheNameArgs),
}

#[derive(Args, Debug)]
pub struct CacheNameArgs {
    /// Cache id or `cachedContents/<id>` name.
    pub name: String,
}

#[derive(Args, Debug)]
pub struct CacheCreateArgs {
    /// File whose contents are cached.
    pub file: PathBuf,

    /// Display name shown in listings.
    #[arg(long)]
    pub display_name: Option<String>,

    /// Model the cache is bound to (defaults to the project model).
    #[arg(long)]
    pub model: Option<String>,

    /// File holding a system instruction.
    #[arg(long)]
    pub system: Option<PathBuf>,

    /// Time to live, e.g. 3600, 90s, 45m, 1h30m, 1d.
    #[arg(long, default_value = "1h")]
    pub ttl: String,

    /// Store the new cache name in the project settings.
    #[arg(long)]
    pub select: bool,
}

#[derive(Args, Debug)]
pub struct CacheTtlArgs {
    pub name: String,

    /// New time to live, e.g. 3600, 90s, 45m, 1h30m, 1d.
    pub ttl: String,
}

#[derive(Subcommand, Debug)]
pub enum LogCommand {
    /// Print the most recent run log.
    Show(LogShowArgs),
}

#[derive(Args, Debug)]
pub struct LogShowArgs {
    /// Log folder instead of the project setting.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
