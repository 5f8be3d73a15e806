//! # Offline Document Commands
//!
//! `docseal hash` and `docseal embed` need neither the ledger nor IPFS.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use docseal_core::{sha256_digest, sha256_reader, CertificateId, ContentDigest};
use docseal_document::{embed, Document};

/// Arguments for `docseal hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// File to hash.
    pub file: PathBuf,
}

/// Arguments for `docseal embed`.
#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// PDF to stamp.
    pub file: PathBuf,
    /// Identifier to render. A fresh one is minted when omitted.
    #[arg(long)]
    pub uuid: Option<CertificateId>,
    /// Where to write the stamped PDF.
    #[arg(long)]
    pub out: PathBuf,
}

/// Print the SHA-256 of a file.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let digest = hash_file(&args.file)?;
    println!("{digest}");
    Ok(0)
}

/// Stamp a PDF with an identifier and write the result.
pub fn run_embed(args: &EmbedArgs) -> Result<u8> {
    let document = read_document(&args.file)?;
    let id = args.uuid.unwrap_or_default();
    let embedded = embed(&document, &id)
        .with_context(|| format!("failed to stamp {}", args.file.display()))?;
    std::fs::write(&args.out, embedded.bytes())
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    tracing::info!(uuid = %id, out = %args.out.display(), "document stamped");
    let summary = serde_json::json!({
        "uuid": id,
        "hash": sha256_digest(embedded.bytes()),
        "out": args.out.display().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(0)
}

/// Stream a file through SHA-256.
pub fn hash_file(path: &Path) -> Result<ContentDigest> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    sha256_reader(BufReader::new(file)).with_context(|| format!("failed to read {}", path.display()))
}

/// Read a file as a document whose media type follows its extension.
pub fn read_document(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Document::from_upload(&file_name, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseal_document::fixture::blank_pdf;

    #[test]
    fn hash_matches_in_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"certificate bytes").unwrap();
        assert_eq!(hash_file(&path).unwrap(), sha256_digest(b"certificate bytes"));
    }

    #[test]
    fn embed_writes_a_stamped_copy() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let out = dir.path().join("out.pdf");
        std::fs::write(&input, blank_pdf(1).unwrap()).unwrap();
        let id = CertificateId::new();

        let code = run_embed(&EmbedArgs {
            file: input.clone(),
            uuid: Some(id),
            out: out.clone(),
        })
        .unwrap();
        assert_eq!(code, 0);

        let expected = embed(&read_document(&input).unwrap(), &id).unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), expected.bytes());
    }

    #[test]
    fn embed_refuses_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, b"plain").unwrap();
        let result = run_embed(&EmbedArgs {
            file: input,
            uuid: None,
            out: dir.path().join("out.pdf"),
        });
        assert!(result.is_err());
        assert!(!dir.path().join("out.pdf").exists());
    }
}
