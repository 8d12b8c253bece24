mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{Write, stdout};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Time, floor and E.G.O usage (needs at least two hours)
    Full,
    /// Floor reached only
    FloorOnly,
}

#[derive(Debug, Parser)]
#[command(name = "lam-admin", version)]
#[command(about = "Moderate the LAM leaderboard store and build submission links")]
#[command(
    after_help = "Commands that change the store (approve, reject, delete) must only run while \
lam-server is stopped; the server's lock does not cover other processes."
)]
pub struct Args {
    /// Leaderboard JSON document (shared with lam-server; stop the server before moderating)
    #[arg(long, global = true, env = "LAM_DB_PATH", default_value = "database/rankings.json")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Approved records, as the public list shows them
    List {
        #[arg(long)]
        sinner: Option<String>,
        #[arg(long)]
        floor: Option<String>,
        /// time, created_at or floor_level
        #[arg(long, default_value = "time")]
        sort: String,
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = lam_core::DEFAULT_PAGE_SIZE)]
        limit: usize,
    },
    /// Records waiting for a decision
    Pending,
    /// One record in full, as JSON
    Show { id: u64 },
    Approve { id: u64 },
    Reject { id: u64 },
    Delete { id: u64 },
    /// Resolve an issue-template persona name to its canonical form
    /// (printed unchanged when the sinner id is not 1-12)
    Normalize { sinner_id: String, name: String },
    /// Template aliases known for a sinner
    Aliases { sinner: String },
    /// Valid floor labels
    Floors,
    /// Build a pre-filled submission link
    IssueUrl {
        #[arg(long, value_enum, default_value_t = KindArg::Full)]
        kind: KindArg,
        /// Sinner id or name
        #[arg(long)]
        sinner: String,
        #[arg(long)]
        persona: String,
        #[arg(long)]
        floor: String,
        /// Clear time in seconds
        #[arg(long, default_value_t = 0)]
        time: u64,
        #[arg(long)]
        ego: bool,
        #[arg(long, default_value = "")]
        note: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut out = stdout().lock();
    commands::run(&args, &mut out)?;
    out.flush()?;
    Ok(())
}
