//! # docseal CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docseal_cli::certificate::{
    run_invalidate, run_issue, run_register, run_show, run_verify, InvalidateArgs, IssueArgs,
    RegisterArgs, ShowArgs, VerifyArgs,
};
use docseal_cli::document::{run_embed, run_hash, EmbedArgs, HashArgs};

/// DocSeal: tamper-evident certificates anchored on a ledger.
#[derive(Parser, Debug)]
#[command(name = "docseal", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the SHA-256 of a file.
    Hash(HashArgs),

    /// Stamp a certificate identifier onto every page of a PDF.
    Embed(EmbedArgs),

    /// Stamp, publish to IPFS and record a certificate on the ledger.
    Issue(IssueArgs),

    /// Check a document against its ledger record.
    Verify(VerifyArgs),

    /// Show a certificate with issuer and student profiles.
    Show(ShowArgs),

    /// Invalidate a certificate. Issuer only.
    Invalidate(InvalidateArgs),

    /// Register the configured account as a student or issuer.
    Register(RegisterArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Hash(args) => run_hash(&args),
        Commands::Embed(args) => run_embed(&args),
        Commands::Issue(args) => run_issue(&args),
        Commands::Verify(args) => run_verify(&args),
        Commands::Show(args) => run_show(&args),
        Commands::Invalidate(args) => run_invalidate(&args),
        Commands::Register(args) => run_register(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
