//! mdbfs binary.
//!
//! Maps a database into a filesystem tree.
//!
//! Usage:
//!   # Mount a SQLite database (needs the `fuse` feature)
//!   mdbfs --type sqlite --db app.sqlite mount /mnt/app
//!
//!   # Inspect without mounting
//!   mdbfs --type kv --db records.db ls /
//!   mdbfs --type sqlite --db app.sqlite cat /users/1/email
//!
//!   # Backend help and versions
//!   mdbfs backends
//!   mdbfs --version

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use mdbfs::config::MdbfsConfig;
use mdbfs::driver::{self, Selection};
use mdbfs::{inspect, mount};
use mdbfs_kernel::BackendRegistry;

/// Map a database into a filesystem.
#[derive(Parser, Debug)]
#[command(name = "mdbfs")]
#[command(about = "Mount databases as filesystems")]
#[command(disable_version_flag = true)]
struct Args {
    /// Configuration file (default: $XDG_CONFIG_HOME/mdbfs/config.ron)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend name or alias, see `mdbfs backends`
    #[arg(short = 't', long = "type", global = true, value_name = "NAME")]
    backend: Option<String>,

    /// Database file to map
    #[arg(short = 'd', long = "db", global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Print mdbfs and backend versions
    #[arg(short = 'v', long)]
    version: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mount the database via FUSE
    Mount {
        mountpoint: PathBuf,

        /// Let other users access the mount
        #[arg(long)]
        allow_other: bool,

        /// Filesystem name shown in the mount table
        #[arg(long)]
        fsname: Option<String>,
    },
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print a file's content
    Cat { path: String },
    /// Print an entry's attributes
    Stat {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print help for every backend
    Backends,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match MdbfsConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mdbfs: {e}");
            return ExitCode::from(driver::EXIT_CONFIG);
        }
    };

    // Logs go to stderr so `cat` output stays clean.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_filter.as_deref().unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("mdbfs: {e:#}");
            ExitCode::from(driver::exit_status(&e))
        }
    }
}

fn run(args: Args, config: MdbfsConfig) -> Result<()> {
    let registry = BackendRegistry::builtin();

    if args.version {
        println!("mdbfs version {}", env!("CARGO_PKG_VERSION"));
        print!("{}", registry.version_text());
        return Ok(());
    }

    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Err(driver::StartupError::NoCommand.into());
    };

    if let Command::Backends = command {
        print!("{}", registry.help_text());
        return Ok(());
    }

    let selection = Selection::resolve(
        &registry,
        args.backend.as_deref(),
        args.database.as_deref(),
        &config,
    )?;
    let fs = selection.open(&registry)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Mount {
            mountpoint,
            allow_other,
            fsname,
        } => {
            let mut options = config.mount.clone();
            options.allow_other |= allow_other;
            if let Some(fsname) = fsname {
                options.fsname = fsname;
            }
            mount::mount(fs, &mountpoint, &options)?;
        }
        Command::Ls { path } => inspect::ls(&fs, &path, &mut out)?,
        Command::Cat { path } => inspect::cat(&fs, &path, &mut out)?,
        Command::Stat { path } => inspect::stat(&fs, &path, &mut out)?,
        Command::Backends => {}
    }
    out.flush()?;
    Ok(())
}
