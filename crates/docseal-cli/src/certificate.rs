//! # Ledger-Backed Commands
//!
//! `issue`, `verify`, `show`, `invalidate` and `register` talk to the ledger
//! gateway and IPFS node configured through the same environment variables
//! the API server reads (`LEDGER_URL`, `LEDGER_ACCOUNT`, `IPFS_API_URL`, ...).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use docseal_client::{ClientConfig, DocsealClient};
use docseal_core::{Address, CertificateId, Ledger};
use docseal_document::{Document, DocumentStore};
use docseal_engine::{CertificationPipeline, VerificationEngine};

use crate::document::read_document;

/// Arguments for `docseal issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// PDF to certify.
    pub file: PathBuf,
    /// Certificate name.
    #[arg(long)]
    pub name: String,
    /// Student account address.
    #[arg(long)]
    pub student: Address,
    /// Also write the stamped PDF here.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `docseal verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// PDF to check, exactly as received.
    pub file: PathBuf,
    #[arg(long)]
    pub uuid: CertificateId,
    #[arg(long)]
    pub issuer: Address,
    #[arg(long)]
    pub student: Address,
}

/// Arguments for `docseal show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    pub uuid: CertificateId,
    /// Account whose perspective sets the viewer flags.
    #[arg(long)]
    pub viewer: Option<Address>,
}

/// Arguments for `docseal invalidate`.
#[derive(Args, Debug)]
pub struct InvalidateArgs {
    pub uuid: CertificateId,
}

/// Arguments for `docseal register`.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Display name for the configured account.
    pub name: String,
    /// Register as an issuer instead of a student.
    #[arg(long)]
    pub issuer: bool,
}

/// Exit code for a document that does not match the ledger.
pub const EXIT_NOT_AUTHENTIC: u8 = 2;

/// Collaborators built from the environment.
struct Connection {
    client: DocsealClient,
}

impl Connection {
    fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env().context("invalid client configuration")?;
        tracing::debug!(?config, "connecting");
        let client = DocsealClient::new(config).context("failed to build HTTP clients")?;
        Ok(Self { client })
    }

    fn ledger(&self) -> Arc<dyn Ledger> {
        Arc::new(self.client.ledger().clone())
    }

    fn engine(&self) -> VerificationEngine {
        VerificationEngine::new(self.ledger(), self.client.gateway().clone())
            .with_retry_policy(self.client.retry_policy())
    }

    fn pipeline(&self) -> Result<CertificationPipeline> {
        let staging = match std::env::var("STAGING_DIR") {
            Ok(dir) => DocumentStore::new(dir),
            Err(_) => DocumentStore::in_temp_dir(),
        }
        .context("failed to prepare staging directory")?;
        Ok(CertificationPipeline::new(
            self.ledger(),
            Arc::new(self.client.ipfs().clone()),
            staging,
            self.client.gateway().clone(),
        )
        .with_retry_policy(self.client.retry_policy()))
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Stamp, publish and record a certificate.
pub fn run_issue(args: &IssueArgs) -> Result<u8> {
    let document = read_document(&args.file)?;
    let pipeline = Connection::from_env()?.pipeline()?;
    runtime()?.block_on(issue(args, &pipeline, document))
}

async fn issue(args: &IssueArgs, pipeline: &CertificationPipeline, document: Document) -> Result<u8> {
    let prepared = pipeline.prepare(document).await?;
    if let Some(out) = &args.out {
        std::fs::write(out, prepared.document.bytes())
            .with_context(|| format!("failed to write {}", out.display()))?;
    }
    let record = pipeline.record(&args.name, &args.student, &prepared).await?;
    print_json(&serde_json::json!({
        "certificate": record,
        "ipfsLink": prepared.gateway_link.as_str(),
    }))?;
    Ok(0)
}

/// Check a document against its ledger record.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let engine = Connection::from_env()?.engine();
    runtime()?.block_on(verify(args, &engine, bytes))
}

async fn verify(args: &VerifyArgs, engine: &VerificationEngine, bytes: Vec<u8>) -> Result<u8> {
    let verdict = engine
        .verify(&args.uuid, &args.issuer, &args.student, bytes)
        .await?;
    if verdict.is_authentic() {
        println!("AUTHENTIC");
        Ok(0)
    } else {
        println!("NOT AUTHENTIC");
        Ok(EXIT_NOT_AUTHENTIC)
    }
}

/// Print a certificate with both parties' profiles.
pub fn run_show(args: &ShowArgs) -> Result<u8> {
    let engine = Connection::from_env()?.engine();
    runtime()?.block_on(show(args, &engine))
}

async fn show(args: &ShowArgs, engine: &VerificationEngine) -> Result<u8> {
    match engine.certificate_view(&args.uuid, args.viewer.as_ref()).await? {
        Some(view) => {
            print_json(&view)?;
            Ok(0)
        }
        None => {
            eprintln!("certificate {} not found", args.uuid);
            Ok(1)
        }
    }
}

/// Mark a certificate invalid. Only its issuer may do this.
pub fn run_invalidate(args: &InvalidateArgs) -> Result<u8> {
    let engine = Connection::from_env()?.engine();
    runtime()?.block_on(invalidate(args, &engine))
}

async fn invalidate(args: &InvalidateArgs, engine: &VerificationEngine) -> Result<u8> {
    let tx = engine.invalidate(&args.uuid).await?;
    print_json(&serde_json::json!({ "uuid": args.uuid, "txHash": tx }))?;
    Ok(0)
}

/// Register the configured account.
pub fn run_register(args: &RegisterArgs) -> Result<u8> {
    let engine = Connection::from_env()?.engine();
    runtime()?.block_on(register(args, &engine))
}

async fn register(args: &RegisterArgs, engine: &VerificationEngine) -> Result<u8> {
    let tx = if args.issuer {
        engine.register_issuer(&args.name).await?
    } else {
        engine.register_user(&args.name).await?
    };
    print_json(&serde_json::json!({
        "account": engine.ledger().account(),
        "txHash": tx,
    }))?;
    Ok(0)
}
