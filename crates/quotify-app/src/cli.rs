use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "quotify", about = "Quotify — a quote a day, kept to yourself")]
pub struct Cli {
    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive console (default)
    Run,

    /// Show whether a session is active
    Status,

    /// Sign in
    ///
    /// Failed-attempt throttling lasts only as long as the process, so
    /// lockouts apply within `run`, not across separate `login` calls.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        passphrase: String,
    },

    /// Sign out, keeping the stored account
    Logout,

    /// Wipe all local session data immediately
    Panic,

    /// Print a quote of the day
    Quote,

    /// List friends of the signed-in user
    Friends,
}
