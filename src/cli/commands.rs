use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ol",
    about = concat!("ol v", env!("CARGO_PKG_VERSION"), " - a local-first outliner"),
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new outline project in the current directory
    Init(InitArgs),
    /// Capture a task at the top (tokens: #tag !now !soon !later !m)
    Add(AddArgs),
    /// List tasks in display order
    List(ListArgs),
    /// Show one task
    Show(IdArg),
    /// Replace a task's text as if typed into its field
    Edit(EditArgs),
    /// Split a task at a character offset
    Split(SplitArgs),
    /// Merge a task with its neighbour
    Merge(MergeArgs),
    /// Indent a task one level
    Indent(IdArg),
    /// Outdent a task one level
    Outdent(IdArg),
    /// Toggle a task's completed flag
    Done(IdArg),
    /// Toggle a task's momentum flag
    Momentum(IdArg),
    /// Set or clear a task's intent
    Intent(IntentArgs),
    /// Remove a tag from a task
    Untag(UntagArgs),
    /// Archive a task, or bring it back with --undo
    Archive(ArchiveArgs),
    /// Delete a task (undoable)
    Rm(IdArg),
    /// Drag a task's block up, down, or sideways
    Mv(MvArgs),
    /// Undo the last change
    Undo,
    /// Read or change outline.toml
    Config(ConfigArgs),
}

impl Commands {
    /// Subcommand name as typed, e.g. `mv`
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Init(_) => "init",
            Commands::Add(_) => "add",
            Commands::List(_) => "list",
            Commands::Show(_) => "show",
            Commands::Edit(_) => "edit",
            Commands::Split(_) => "split",
            Commands::Merge(_) => "merge",
            Commands::Indent(_) => "indent",
            Commands::Outdent(_) => "outdent",
            Commands::Done(_) => "done",
            Commands::Momentum(_) => "momentum",
            Commands::Intent(_) => "intent",
            Commands::Untag(_) => "untag",
            Commands::Archive(_) => "archive",
            Commands::Rm(_) => "rm",
            Commands::Mv(_) => "mv",
            Commands::Undo => "undo",
            Commands::Config(_) => "config",
        }
    }
}

#[derive(Args)]
pub struct InitArgs {
    /// Project name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID or unique prefix
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task text, tokens included
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter: words match text, #words match tags
    pub query: Option<String>,
    /// Only tasks with momentum
    #[arg(long)]
    pub momentum: bool,
    /// Include archived tasks
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID or unique prefix
    pub id: String,
    /// New raw text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Task ID or unique prefix
    pub id: String,
    /// Character offset to split at
    pub cursor: usize,
    /// Live text to split instead of the stored text
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("direction").required(true).args(["back", "forward"])))]
pub struct MergeArgs {
    /// Task ID or unique prefix
    pub id: String,
    /// Merge into the previous task
    #[arg(long)]
    pub back: bool,
    /// Absorb the next task
    #[arg(long)]
    pub forward: bool,
}

#[derive(Args)]
pub struct IntentArgs {
    /// Task ID or unique prefix
    pub id: String,
    /// now, soon, later, or none
    pub intent: String,
}

#[derive(Args)]
pub struct UntagArgs {
    /// Task ID or unique prefix
    pub id: String,
    /// Tag to remove (with or without #)
    pub tag: String,
}

#[derive(Args)]
pub struct ArchiveArgs {
    /// Task ID or unique prefix
    pub id: String,
    /// Unarchive instead
    #[arg(long)]
    pub undo: bool,
}

#[derive(Args)]
#[command(group(ArgGroup::new("vertical").args(["down", "up"])))]
pub struct MvArgs {
    /// Task ID or unique prefix
    pub id: String,
    /// Rows to move down
    #[arg(long)]
    pub down: Option<usize>,
    /// Rows to move up
    #[arg(long)]
    pub up: Option<usize>,
    /// Indent levels to shift (negative to outdent)
    #[arg(long, allow_hyphen_values = true)]
    pub shift: Option<i64>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Key as section.key (e.g. undo.limit); omit to print the config
    pub key: Option<String>,
    /// New value; omit to print the current one
    pub value: Option<String>,
}
