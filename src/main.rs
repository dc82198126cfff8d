//! Main entry point for the `ngs-vcf` CLI.

use clap::{command, Args, Parser, Subcommand};
use ngs_vcf::{common, convert};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Conversion of SnpEff-annotated VCF files into reports"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Conversion-related commands.
    Convert(Convert),
}

/// Parsing of "convert *" sub commands.
#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
struct Convert {
    /// The sub command to run
    #[command(subcommand)]
    command: ConvertCommands,
}

/// Enum supporting the parsing of "convert *" sub commands.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Subcommand)]
enum ConvertCommands {
    Maf(convert::maf::Args),
    Tsv(convert::tsv::Args),
    Effects(convert::effects::Args),
    Summaries(convert::summaries::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    tracing::subscriber::with_default(collector, || {
        tracing::info!("ngs-vcf {} startup", common::version());

        match &cli.command {
            Commands::Convert(convert) => match &convert.command {
                ConvertCommands::Maf(args) => convert::maf::run(&cli.common, args)?,
                ConvertCommands::Tsv(args) => convert::tsv::run(&cli.common, args)?,
                ConvertCommands::Effects(args) => convert::effects::run(&cli.common, args)?,
                ConvertCommands::Summaries(args) => convert::summaries::run(&cli.common, args)?,
            },
        }

        tracing::info!("All done. Have a nice day!");

        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
