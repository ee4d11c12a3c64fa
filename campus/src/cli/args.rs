//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::models::{Category, PostId, UserId};

/// Campus Creatives - share posts and photos with your campus
#[derive(Parser, Debug)]
#[command(name = "campus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Social API base URL (overrides config and CAMPUS_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute (defaults to showing the feed)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Account ===
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account (needs admin approval before logging in)
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },

    /// Show a user's public profile and posts
    User {
        id: UserId,
    },

    // === Posts ===
    /// List posts with their comments
    Feed {
        /// Only posts by this user
        #[arg(long)]
        author: Option<UserId>,
    },

    /// Show one post and its comments
    Show {
        id: PostId,
    },

    /// Publish a post
    Create(PostFields),

    /// Edit one of your posts
    Edit {
        id: PostId,

        #[command(flatten)]
        fields: PostFields,
    },

    /// Delete one of your posts
    Delete {
        id: PostId,
    },

    /// Like a post, or remove your like
    Like {
        id: PostId,
    },

    /// Comment on a post
    Comment {
        id: PostId,

        /// Comment text
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
    },

    // === Saved posts ===
    /// Save a post for later
    Save {
        id: PostId,
    },

    /// Remove a post from your saved list
    Unsave {
        id: PostId,
    },

    /// List saved posts
    Saved,

    // === Gallery ===
    /// Browse the photo gallery
    Gallery(GalleryArgs),

    /// Switch dark mode on or off
    Theme {
        #[arg(value_enum)]
        mode: Option<ThemeMode>,
    },

    /// Serve the gallery and image search proxy
    Serve {
        /// Port to listen on (defaults to the configured proxy port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory of gallery images served under /assets
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },
}

#[derive(Args, Debug)]
pub struct PostFields {
    #[arg(short, long)]
    pub title: String,

    #[arg(short, long)]
    pub content: String,

    /// Image file to attach
    #[arg(short, long)]
    pub image: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// Show your profile (default)
    Show,

    /// Change username, bio or avatar
    Update {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        bio: Option<String>,

        /// Avatar image file
        #[arg(short, long)]
        avatar: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct GalleryArgs {
    /// Category to show
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = Category::All)]
    pub category: Category,

    /// Filter by title, or keyword for image search
    #[arg(short, long)]
    pub query: Option<String>,

    /// Search online images instead of the curated gallery
    #[arg(short, long)]
    pub search: bool,

    /// Number of search results
    #[arg(long, default_value = "20")]
    pub per_page: u32,

    /// Open a photo by id
    #[arg(long)]
    pub open: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeMode {
    On,
    Off,
    Toggle,
}
