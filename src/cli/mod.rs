pub mod init;
pub mod migrate;
pub mod serve;
pub mod stats;
pub mod user;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lectern")]
#[command(version)]
#[command(about = "A multi-author blogging platform", long_about = None)]
pub struct Cli {
    #[arg(short, long, default_value = "lectern.toml", env = "LECTERN_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter configuration
    Init {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Migrate the database and start the HTTP server
    Serve {
        #[arg(short = 'H', long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    Migrate {
        #[command(subcommand)]
        command: Option<MigrateCommand>,
    },
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Print platform statistics, or one author's dashboard
    Stats {
        #[arg(long)]
        author: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum MigrateCommand {
    /// List migrations and whether they have been applied
    Status,
}

#[derive(Subcommand)]
pub enum UserCommand {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    List,
    Deactivate {
        username: String,
    },
    Activate {
        username: String,
    },
    Remove {
        username: String,
    },
    Passwd {
        username: String,
    },
}
