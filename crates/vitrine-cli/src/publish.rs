//! # Publish Subcommand
//!
//! Reads one image from disk, optionally asks a describer to pre-fill
//! empty metadata, and runs one publish attempt. A failed attempt prints
//! its status line and exits 1; nothing is retried.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use url::Url;

use vitrine_core::{ArtifactMetadata, NewArtifact};
use vitrine_store::Credential;
use vitrine_sync::{fill_metadata, guess_mime, HttpDescriber, Publisher};

use crate::Session;

/// Arguments for `vitrine publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Image file to publish.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[arg(long, default_value = "")]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "")]
    pub medium: String,

    /// Tag to attach. Repeat for several; order is kept.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Describer endpoint used to fill empty fields.
    #[arg(long, value_name = "URL")]
    pub describe_url: Option<Url>,

    /// Bearer key for the describer.
    #[arg(long, env = "VITRINE_DESCRIBE_KEY", hide_env_values = true)]
    pub describe_key: Option<String>,
}

impl PublishArgs {
    fn manual_metadata(&self) -> ArtifactMetadata {
        ArtifactMetadata {
            title: self.title.clone(),
            description: self.description.clone(),
            medium: self.medium.clone(),
            tags: self.tags.clone(),
        }
        .normalize_tags()
    }
}

pub async fn run_publish(args: &PublishArgs, session: &Session) -> Result<u8> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read image: {}", args.file.display()))?;
    let file_name = file_name_of(&args.file)?;

    let mut metadata = args.manual_metadata();
    if let Some(endpoint) = &args.describe_url {
        let describer = HttpDescriber::new(
            endpoint.clone(),
            args.describe_key.clone().map(Credential::new),
            session.endpoints.timeout_secs,
        )?;
        metadata = fill_metadata(&describer, &bytes, guess_mime(&file_name), metadata).await;
    }

    let store = session.open_store()?;
    let publisher = Publisher::new(Arc::new(store), session.endpoints.layout.clone());

    match publisher
        .publish(NewArtifact::new(file_name, bytes, metadata))
        .await
    {
        Ok(receipt) => {
            if receipt.recovered_from_corruption {
                eprintln!(
                    "WARNING: {} was unreadable and has been replaced; earlier entries are no longer listed",
                    publisher.layout().manifest_path
                );
            }
            println!(
                "OK: published {} ({} entries)",
                receipt.record.locator, receipt.manifest_len
            );
            println!("id: {}", receipt.record.id);
            Ok(0)
        }
        Err(e) => {
            tracing::debug!(error = %e, "publish failed");
            eprintln!("{}", e.status());
            Ok(1)
        }
    }
}

fn file_name_of(path: &Path) -> Result<String> {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => bail!("not a file path: {}", path.display()),
    }
}
