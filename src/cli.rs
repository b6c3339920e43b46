use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use novelmark::progress::DEFAULT_CONTINUE_LIMIT;

#[derive(Debug, Parser)]
#[command(
    name = "novelmark",
    version,
    about = "Track novel reading progress and pick up where you left off"
)]
pub struct Cli {
    /// Novel catalog JSON (defaults to novels.json in the data directory)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a visit to a chapter
    Read { novel: String, chapter: u32 },
    /// Save or show the scroll position within a chapter
    Scroll {
        novel: String,
        chapter: u32,
        #[arg(allow_negative_numbers = true)]
        percent: Option<f64>,
    },
    /// All reading progress, most recent first
    List,
    /// Recently read novels from the catalog
    Continue {
        #[arg(long, default_value_t = DEFAULT_CONTINUE_LIMIT)]
        limit: usize,
    },
    Search { query: String },
    /// Latest chapter updates
    Latest,
    /// Table of contents for a novel
    Chapters {
        novel: String,
        #[arg(long)]
        desc: bool,
    },
    Theme { action: Option<ThemeAction> },
    Font { action: Option<FontAction> },
    Tui,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThemeAction {
    Light,
    Dark,
    Toggle,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FontAction {
    Up,
    Down,
    Reset,
}
