//! # List Subcommand
//!
//! Reads the catalog over the public path, exactly as the gallery does.
//! An unreachable or unreadable manifest lists as empty; the cause is
//! logged at `warn`.

use anyhow::Result;
use clap::Args;

use vitrine_core::{manifest, ArtifactRecord};
use vitrine_sync::CatalogCache;

use crate::Session;

/// Arguments for `vitrine list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print the manifest JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

pub async fn run_list(args: &ListArgs, session: &Session) -> Result<u8> {
    let store = session.open_store()?;
    let cache = CatalogCache::new(session.endpoints.layout.manifest_path.clone());
    let records = cache.refresh(&store).await;

    if args.json {
        let json = manifest::to_json(&records)?;
        print!("{}", String::from_utf8_lossy(&json));
    } else if records.is_empty() {
        println!("No published images.");
    } else {
        for record in &records {
            println!("{}", render_row(record));
        }
    }
    Ok(0)
}

fn render_row(record: &ArtifactRecord) -> String {
    let title = if record.title.trim().is_empty() {
        "(untitled)"
    } else {
        record.title.as_str()
    };
    let mut row = format!("{}  {}  {}", record.created_at.to_rfc3339(), title, record.locator);
    if !record.tags.is_empty() {
        row.push_str(&format!("  [{}]", record.tags.join(", ")));
    }
    row
}
