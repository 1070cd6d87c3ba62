//! NFTS CLI - sign and verify record units of NFTS batch documents.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod artifacts;
mod commands;
mod config;
mod keystore;
mod output;

use commands::{canonicalize, compare, sign, verify};

#[derive(Parser)]
#[command(name = "nfts")]
#[command(about = "Sign and verify NFTS record units over their canonical tpNFTS form")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign every NFTS unit of a batch document
    Sign {
        /// Unsigned batch document
        input: PathBuf,
        /// Output file (SOAP request, or bare document with --no-envelope)
        output: PathBuf,
        /// Private key PEM (PKCS#8 or PKCS#1)
        #[arg(long)]
        key: PathBuf,
        /// Certificate PEM matching the key
        #[arg(long)]
        cert: Option<PathBuf>,
        /// Schema profile id
        #[arg(long)]
        profile: Option<String>,
        /// Write canonical, hash and signature files per unit
        #[arg(long)]
        debug_dir: Option<PathBuf>,
        /// Write the signed document without the SOAP envelope
        #[arg(long)]
        no_envelope: bool,
        /// Also sign the whole document with xmlsec1
        #[arg(long)]
        document_signature: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Verify the signature of every NFTS unit
    Verify {
        /// Signed batch document or SOAP request
        input: PathBuf,
        /// Certificate (PEM or DER) or public key PEM
        #[arg(long)]
        cert: PathBuf,
        /// Schema profile id
        #[arg(long)]
        profile: Option<String>,
        /// Write canonical, hash and signature files per unit
        #[arg(long)]
        debug_dir: Option<PathBuf>,
        /// Exit with error code unless every unit is valid
        #[arg(long)]
        strict: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show canonical bytes for each NFTS unit
    Canonicalize {
        /// Batch document or SOAP request
        input: PathBuf,
        /// Schema profile id
        #[arg(long)]
        profile: Option<String>,
        /// Only this unit (1-based)
        #[arg(long)]
        unit: Option<usize>,
        /// Output as JSON with canonicalization reports
        #[arg(long)]
        json: bool,
    },
    /// Compare debug files written by two implementations
    Compare {
        /// First debug directory
        dir_a: PathBuf,
        /// Second debug directory
        dir_b: PathBuf,
        /// Unit to compare (1-based)
        #[arg(long, default_value_t = 1)]
        unit: usize,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,nfts={level},nfts_core={level},nfts_envelope={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Sign {
            input,
            output,
            key,
            cert,
            profile,
            debug_dir,
            no_envelope,
            document_signature,
            json,
        } => sign::run(
            &config,
            sign::Options {
                input,
                output,
                key,
                cert,
                profile,
                debug_dir,
                no_envelope,
                document_signature,
                json,
            },
        ),
        Commands::Verify {
            input,
            cert,
            profile,
            debug_dir,
            strict,
            json,
        } => verify::run(&config, input, cert, profile, debug_dir, strict, json),
        Commands::Canonicalize {
            input,
            profile,
            unit,
            json,
        } => canonicalize::run(&config, input, profile, unit, json),
        Commands::Compare { dir_a, dir_b, unit } => compare::run(dir_a, dir_b, unit),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
