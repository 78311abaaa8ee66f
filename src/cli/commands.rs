use clap::{Parser, Subcommand};

/// `DocSync` - documents with automatic saving, from the terminal.
#[derive(Parser, Debug)]
#[command(name = "docsync")]
#[command(version)]
#[command(about = "Create, list and edit documents with debounced autosave.", long_about = None)]
pub struct Cli {
    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and remember the session
    Login {
        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// Create an account and sign in with it
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,
    },

    /// Forget the stored session
    Logout,

    /// Show configuration and session state
    Status,

    /// List your documents
    List {
        /// Only show titles containing this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Create an empty document
    Create {
        title: String,
    },

    /// Delete a document
    Delete {
        id: String,
    },

    /// Print a document's title and text
    Show {
        id: String,
    },

    /// Edit a document from stdin; every line is appended and autosaved.
    ///
    /// Lines starting with `:` are commands: `:save`, `:title <new title>`,
    /// `:status`, `:quit`.
    Edit {
        id: String,

        /// Rename the document before editing
        #[arg(long)]
        title: Option<String>,
    },
}
