use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "notestore")]
#[command(version, about = "Project notes with search and file attachments")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new note store in the current directory
    Init,

    /// Manage users
    User(UserCommand),

    /// Manage projects
    Project(ProjectCommand),

    /// Write, find and attach files to notes
    Note(NoteCommand),
}

#[derive(Args, Debug)]
pub struct UserCommand {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Add a new user
    Add {
        /// Display name
        name: String,

        #[arg(long)]
        email: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ProjectCommand {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// Add a new project
    Add {
        /// Project name
        name: String,

        /// Id of the owning user
        #[arg(long)]
        owner: Uuid,

        #[arg(long)]
        description: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct NoteCommand {
    #[command(subcommand)]
    pub action: NoteAction,
}

#[derive(Subcommand, Debug)]
pub enum NoteAction {
    /// Add a note to a project
    Add {
        /// Note text
        message: String,

        /// Id of the authoring user
        #[arg(long)]
        user: Uuid,

        /// Id of the project the note belongs to
        #[arg(long)]
        project: Uuid,

        /// File to attach to the new note
        #[arg(long, value_name = "PATH")]
        attach: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single note
    Get {
        /// Note id (full UUID or unique prefix like "a1b2c")
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List notes
    List {
        /// Only notes on this project
        #[arg(long)]
        project: Option<Uuid>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search note messages (case-insensitive substring match)
    Search {
        /// Search text, matched verbatim; project:, user:, created:> and created:< tokens are filters
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Attach a file to a note, replacing any existing attachment
    Attach {
        /// Note id (full UUID or unique prefix)
        id: String,

        /// File to attach
        path: PathBuf,
    },

    /// Delete a note and its attachment
    Delete {
        /// Note id (full UUID or unique prefix)
        id: String,
    },
}
