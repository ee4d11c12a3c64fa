//! Campus Creatives - a command-line client for the campus social feed.
//!
//! Log in, browse and interact with posts, keep a local list of saved
//! posts, and browse the photo gallery.
//!
//! Architecture:
//! - The social API is remote; this binary is a client for it
//! - Client state (session token, saved posts, theme) lives in one JSON
//!   storage file behind the preferences store
//! - `campus serve` runs a small local server for the gallery and for image
//!   search, keeping the Pexels key out of the client

mod api;
mod cli;
mod config;
mod feed;
mod gallery;
mod logging;
mod models;
mod prompt;
mod saved;
mod server;
mod session;
mod store;
mod validate;

use anyhow::Result;
use clap::Parser;

use cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    execute(cli).await
}
