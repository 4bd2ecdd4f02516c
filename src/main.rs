use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use tracing::Level;

use ccreplay::{
    Change, ChangeReconstructor, ChangeSet, ChangeSetGrouper, Cleartool, Config, HistoryFetcher,
};

#[derive(Parser)]
#[command(name = "ccreplay")]
#[command(about = "Rebuild commit-shaped history from ClearCase element history")]
struct Cli {
    /// Configuration file (default: ./ccreplay.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the reconstructed changesets
    History {
        #[command(flatten)]
        scan: ScanArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replay the reconstructed changesets as commits in a git repository
    ToGit {
        #[command(flatten)]
        scan: ScanArgs,

        /// Git work tree to commit into (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Root directory of the history to reconstruct
    root: PathBuf,

    /// Only consider versions on this branch
    #[arg(long)]
    branch: Option<String>,

    /// Only consider versions created since this time (e.g. 2010-06-01)
    #[arg(long, value_parser = ccreplay::history::parse_since)]
    since: Option<NaiveDateTime>,

    /// Seconds within which matching check-ins join one changeset
    #[arg(long, value_name = "SECS")]
    window: Option<i64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::WARN,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::History { scan, json } => {
            let changesets = scan_changesets(&config, &scan)?;
            let mut out = std::io::stdout().lock();
            if json {
                ccreplay::report::write_json(&mut out, &changesets)?;
            } else {
                ccreplay::report::write_text(&mut out, &changesets)?;
            }
            out.flush()?;
        }
        Command::ToGit { scan, repo } => {
            let git = ccreplay::git::Git::discover(&repo)
                .with_context(|| format!("opening git repository at {}", repo.display()))?;
            let changesets = scan_changesets(&config, &scan)?;
            let summary = ccreplay::replay(&git, &changesets).context("replaying into git")?;
            tracing::info!(
                commits = summary.commits.len(),
                skipped = summary.skipped,
                "replay complete"
            );
        }
    }

    Ok(())
}

/// Reconstruct the history below `scan.root` and group it into changesets.
fn scan_changesets(config: &Config, scan: &ScanArgs) -> anyhow::Result<Vec<ChangeSet<Change>>> {
    let root = std::path::absolute(&scan.root)
        .with_context(|| format!("resolving {}", scan.root.display()))?;
    let root = root.to_string_lossy().into_owned();

    let branch = scan.branch.as_deref().or(config.history.branch.as_deref());
    let window = match scan.window {
        Some(secs) => ccreplay::config::window_from_secs(secs).context("--window")?,
        None => config.grouping.window()?,
    };

    let cleartool = Cleartool::new(config.cleartool.program.clone());
    let fetcher = HistoryFetcher::new(&cleartool, root.clone())
        .with_sentinel(config.history.comment_sentinel.clone());
    let changes = ChangeReconstructor::new(fetcher)
        .reconstruct(branch, scan.since)
        .with_context(|| format!("reconstructing history of {root}"))?;

    Ok(ChangeSetGrouper::group(window, changes))
}
