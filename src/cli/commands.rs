use clap::{Parser, Subcommand};

use crate::models::DEFAULT_CATEGORY_COLOR;

#[derive(Parser)]
#[command(
    name = "taskdeck",
    version,
    about = "Personal task and category manager",
    after_help = "\
NOTE:
  Data lives in <dir>/.taskdeck (found by walking up from the current directory),
  or in $TASKDECK_HOME when set. Run `taskdeck init` and `taskdeck login` first.

EXIT CODES:
  0  Success
  1  Error (not signed in, validation, store failure, etc.)

LOGGING:
  Diagnostics go to stderr. Set RUST_LOG (e.g. RUST_LOG=taskdeck=debug) for more."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Location the command runs from, e.g. "/tasks?redirect=/reports"
    #[arg(long, global = true, default_value = "/")]
    pub location: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a taskdeck workspace in this directory
    Init,

    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Category management
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Show completion stats and open tasks per category
    Status,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a task
    Add {
        /// Task title
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// low | medium | high (anything else becomes medium)
        #[arg(long)]
        priority: Option<String>,
        /// Category id or name
        #[arg(long)]
        category: Option<String>,
    },
    /// List tasks
    List {
        /// all | pending | completed | today | overdue
        #[arg(long, default_value = "all")]
        filter: String,
        /// Category id or name
        #[arg(long)]
        category: Option<String>,
    },
    /// Show task details
    Show {
        /// Task ID or prefix
        id: String,
    },
    /// Edit a task
    #[command(after_help = "\
NOTE:
  Only the given fields change. Pass an empty string to --due or --category to clear it.")]
    Edit {
        /// Task ID or prefix
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Flip a task between pending and completed
    Toggle {
        /// Task ID or prefix
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID or prefix
        id: String,
    },
    /// Find tasks whose title or description contains a term
    Search {
        term: String,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a category
    Add {
        name: String,
        #[arg(long, default_value = DEFAULT_CATEGORY_COLOR)]
        color: String,
    },
    /// List categories with their open task counts
    List,
    /// Delete a category (tasks keep their reference)
    Delete {
        /// Category id or name
        id: String,
    },
}
