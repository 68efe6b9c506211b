//! pak - command-line tool for pakstore packages

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use pakstore::{AddFlags, Package, PackageBuilder, PackageConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pak")]
#[command(about = "Inspect and edit single-file packages")]
struct Args {
    /// Path to the package file
    package: PathBuf,

    /// TOML file with package settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Open the package read-only
    #[arg(long)]
    read_only: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty package (overwrites an existing file)
    Create,

    /// Add an external file
    Add {
        /// File to read
        source: PathBuf,

        /// Entry name (defaults to the source file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Replace an existing entry with the same name
        #[arg(short, long)]
        replace: bool,
    },

    /// Remove an entry
    Rm { name: String },

    /// List entries in offset order
    Ls,

    /// Write an entry's content to stdout
    Cat { name: String },

    /// Copy an entry's content to a file
    Extract { name: String, dest: PathBuf },

    /// Print size and fragmentation statistics as JSON
    Stats,

    /// Pack content and truncate the file
    Defrag,
}

fn open(args: &Args) -> anyhow::Result<Package> {
    let mut config = match &args.config {
        Some(path) => PackageConfig::from_file(path)
            .with_context(|| format!("loading config {:?}", path))?,
        None => PackageConfig::default(),
    };
    config.read_only |= args.read_only;

    PackageBuilder::new()
        .path(&args.package)
        .config(config)
        .open()
        .with_context(|| format!("opening package {:?}", args.package))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match &args.command {
        Command::Create => {
            if args.read_only {
                bail!("cannot create a package in read-only mode");
            }
            Package::create(&args.package)?.close()?;
            info!("Created {:?}", args.package);
        }
        Command::Add {
            source,
            name,
            replace,
        } => {
            let name = match name {
                Some(name) => name.clone(),
                None => source
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .context("source has no usable file name; pass --name")?,
            };
            let flags = if *replace {
                AddFlags::REPLACE
            } else {
                AddFlags::NONE
            };

            let mut pkg = open(&args)?;
            pkg.add_file(source, &name, flags)
                .with_context(|| format!("adding {:?} as {}", source, name))?;
            pkg.close()?;
        }
        Command::Rm { name } => {
            let mut pkg = open(&args)?;
            pkg.remove_file(name)?;
            pkg.close()?;
        }
        Command::Ls => {
            let pkg = open(&args)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for entry in pkg.entries() {
                writeln!(
                    out,
                    "{:>12} {:>12}  {}",
                    entry.offset,
                    entry.size,
                    entry.name.as_deref().unwrap_or("?")
                )?;
            }
        }
        Command::Cat { name } => {
            let pkg = open(&args)?;
            let mut reader = pkg.open_file(name)?;
            io::copy(&mut reader, &mut io::stdout().lock())?;
            pkg.close_file(reader);
        }
        Command::Extract { name, dest } => {
            let pkg = open(&args)?;
            let mut reader = pkg.open_file(name)?;
            let mut file = std::fs::File::create(dest)
                .with_context(|| format!("creating {:?}", dest))?;
            let copied = io::copy(&mut reader, &mut file)?;
            pkg.close_file(reader);
            info!("Extracted {} ({} bytes) to {:?}", name, copied, dest);
        }
        Command::Stats => {
            let pkg = open(&args)?;
            let stats = pkg.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Defrag => {
            let mut pkg = open(&args)?;
            let before = pkg.count_fragment_size()?;
            pkg.defrag()?;
            info!(
                "Reclaimed {} bytes ({} bytes moved)",
                before.reclaimable, before.bytes_to_move
            );
            pkg.close()?;
        }
    }

    Ok(())
}
