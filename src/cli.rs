use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "playsession",
    version,
    about = "Browse a title's episodes and sources, resuming where you left off"
)]
pub struct Cli {
    /// Host page document describing the title, its seasons and sources.
    #[arg(long, global = true, default_value = "page.json")]
    pub page: PathBuf,

    /// Override the preference database path.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Keep preferences in memory for this run only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive player view (default).
    Tui,
    /// Restore the bookmarked episode and print what would play.
    Resume,
    /// Restore, then advance to the next episode.
    Next,
    /// Restore, then step back to the previous episode.
    Prev,
    /// Show stored preferences for this title.
    Prefs,
    /// Remove this title's bookmarks (the layout preference is kept).
    Forget,
}
