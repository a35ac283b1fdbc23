//! CLI argument parsing using clap.
//!
//! Contains the Cli struct, Commands enum, and all subcommand enums.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::types::Position;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Tag code ranges and keep them attached as files change
#[derive(Parser)]
#[command(
    name = "tagmire",
    version = env!("CARGO_PKG_VERSION"),
    about = "Tag code ranges and keep them attached as files change",
    long_about = "Tag ranges of source files with notes. Annotations follow their text \
                  through edits, moves, and renames.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ tagmire init\n  $ tagmire tags add todo\n  $ tagmire annotate src/main.rs 10:0 12:1 --tag todo --note \"split this\"\n  $ tagmire watch\n\nPositions are zero-based line:character, characters in UTF-16 units."
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .tagmire directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .tagmire/settings.toml")]
    Config,

    /// Manage tags
    #[command(about = "Create, edit, list, and delete tags")]
    Tags {
        #[command(subcommand)]
        action: TagAction,
    },

    /// Annotate a range of a file
    #[command(
        about = "Attach tags and a note to a range of a file",
        after_help = "Examples:\n  tagmire annotate src/lib.rs 4:0 9:1 --tag review\n  tagmire annotate src/lib.rs 12:4 12:20 --tag bug --tag perf --note \"allocates per call\""
    )]
    Annotate {
        /// File to annotate
        file: PathBuf,

        /// Start position (line:character)
        start: Position,

        /// End position (line:character)
        end: Position,

        /// Tag id or name (repeatable)
        #[arg(short, long = "tag", required = true)]
        tags: Vec<String>,

        /// Free-form note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// List annotations
    #[command(about = "List annotations, optionally for one file or tag")]
    List {
        /// Only annotations on this file
        file: Option<PathBuf>,

        /// Only annotations carrying this tag (id or name)
        #[arg(short, long)]
        tag: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove annotations at a position
    #[command(about = "Delete every annotation covering a position")]
    Remove {
        file: PathBuf,

        /// Position (line:character)
        position: Position,
    },

    /// Validate annotations against current file contents
    #[command(
        about = "Reanchor annotations whose text moved",
        long_about = "Compare each annotation's captured text with the file on disk and \
                      relocate the ones that moved. Checks every annotated file when none \
                      are given."
    )]
    Check {
        files: Vec<PathBuf>,
    },

    /// Move annotations to a renamed file
    #[command(about = "Retarget annotations after a file was renamed")]
    Mv { old: PathBuf, new: PathBuf },

    /// Watch annotated files
    #[command(about = "Keep annotations anchored while files change (Ctrl-C to stop)")]
    Watch,
}

/// Tag subcommands
#[derive(Subcommand)]
pub enum TagAction {
    /// Create a tag
    Add {
        name: String,

        /// Hex color, e.g. #E74C3C (defaults to the next palette color)
        #[arg(long)]
        color: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Rename a tag or change its color or description
    Edit {
        /// Tag id or name
        tag: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// List tags
    List,

    /// Delete a tag and drop it from every annotation
    Delete {
        /// Tag id or name
        tag: String,
    },
}
