// Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

mod cargo;
mod header;
mod partition_table;

use partition_table::{CreateArgs, ReadArgs};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Xtask {
    /// Log at debug level
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    xtask: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Commands related to OTA partition tables
    PartitionTable {
        #[command(subcommand)]
        subcommand: PartitionTableCommands,
    },
    /// Run clippy on all targets
    Clippy,
    /// Check that all files are formatted
    Format,
    /// Run pre-check-in checks
    Precheckin,
    /// Check files for Apache license header
    HeaderCheck,
    /// Add Apache license header to files where it is missing
    HeaderFix,
    /// Run tests
    Test,
}

#[derive(Subcommand)]
enum PartitionTableCommands {
    /// Compute a partition layout and write the partition table
    Create(CreateArgs),
    /// Verify an existing partition table
    Verify(ReadArgs),
    /// Print the header and regions of an existing partition table
    Show(ReadArgs),
}

fn main() {
    let cli = Xtask::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = SimpleLogger::new().with_level(level).env().init();

    let result = match &cli.xtask {
        Commands::PartitionTable { subcommand } => match subcommand {
            PartitionTableCommands::Create(args) => partition_table::create(args),
            PartitionTableCommands::Verify(args) => partition_table::verify(args),
            PartitionTableCommands::Show(args) => partition_table::show(args),
        },
        Commands::Clippy => cargo::clippy(),
        Commands::Format => cargo::format(),
        Commands::Precheckin => cargo::precheckin(),
        Commands::HeaderCheck => header::check(),
        Commands::HeaderFix => header::fix(),
        Commands::Test => cargo::test(),
    };
    result.unwrap_or_else(|e| {
        eprintln!("Error: {:#}", e);
        std::process::exit(partition_table::exit_code(&e));
    });
}
