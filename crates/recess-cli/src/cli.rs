use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "recess",
    about = "Recess: user accounts and time-off tracking",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the collection files (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

impl Cli {
    /// `serve` logs at INFO; administrative commands only log warnings
    /// unless `--verbose` is given.
    pub fn log_level(&self) -> Level {
        match (&self.command, self.verbose) {
            (_, true) => Level::DEBUG,
            (Command::Serve(_), false) => Level::INFO,
            (_, false) => Level::WARN,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Manage user accounts
    User(UserArgs),
    /// Record and inspect time off
    TimeOff(TimeOffArgs),
    /// Generate passphrases that satisfy the password policy
    Passphrase(PassphraseArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides the config file)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a user; a passphrase is generated when --password is omitted
    Add {
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Show one user
    Show { username: String },
    /// List all users
    List,
    /// Change a user's password
    Passwd {
        username: String,
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// Replace a user's password with a generated passphrase
    Reset { username: String },
}

#[derive(Args)]
pub struct TimeOffArgs {
    #[command(subcommand)]
    pub action: TimeOffAction,
}

#[derive(Subcommand)]
pub enum TimeOffAction {
    /// Record a day off (date as YYYY-MM-DD)
    Add {
        username: String,
        date: String,
        #[arg(short, long, default_value = "On Vacation")]
        reason: String,
    },
    /// List one user's time off, or everyone's
    List { username: Option<String> },
    /// Remove a recorded day
    Delete { username: String, date: String },
    /// Who is off on a day (default: today)
    Today {
        #[arg(long)]
        date: Option<String>,
    },
    /// List the recognised reasons
    Types,
}

#[derive(Args)]
pub struct PassphraseArgs {
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,
}
