//! # Connection Subcommands
//!
//! `configure`, `verify`, `show-config`, and `forget`. A connection is
//! saved only after the access probe confirms write permission; a failed
//! probe leaves any previously saved connection untouched.

use anyhow::Result;
use clap::Args;

use vitrine_store::{Credential, StoreConnection, DEFAULT_BRANCH};
use vitrine_sync::{AccessReport, AccessVerifier};

use crate::Session;

/// Arguments for `vitrine configure`.
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Account or organization that owns the collection.
    #[arg(long)]
    pub owner: String,

    /// Repository holding the manifest and images.
    #[arg(long)]
    pub collection: String,

    /// Branch to read and commit on.
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Access token with contents write permission.
    #[arg(long, env = "VITRINE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Verify the collection and save the connection.
pub async fn run_configure(args: &ConfigureArgs, session: &Session) -> Result<u8> {
    let connection = StoreConnection::new(
        args.owner.trim(),
        args.collection.trim(),
        args.branch.trim(),
        args.token.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(Credential::new),
    );
    connection.validate()?;
    let slug = connection.slug();

    let store = session.store_for(connection.clone())?;
    let report = AccessVerifier::report(&store).await;
    print_warnings(&report);

    if !report.writable {
        eprintln!("FAIL: {slug} cannot be published to; connection not saved");
        return Ok(1);
    }

    session.config.save(&connection)?;
    println!(
        "OK: connected to {slug} on {} ({} collection); saved to {}",
        connection.branch,
        report.visibility,
        session.config.path().display()
    );
    Ok(0)
}

/// Re-run the access and visibility probes for the saved connection.
pub async fn run_verify(session: &Session) -> Result<u8> {
    let connection = session.connection()?;
    let slug = connection.slug();
    let store = session.store_for(connection)?;

    let report = AccessVerifier::report(&store).await;
    print_warnings(&report);
    if report.writable {
        println!("OK: {slug} is writable ({} collection)", report.visibility);
        Ok(0)
    } else {
        eprintln!("FAIL: {slug} is not writable");
        Ok(1)
    }
}

pub fn run_show_config(session: &Session) -> Result<u8> {
    match session.config.load()? {
        Some(connection) => {
            print!("{}", render_connection(&connection));
            println!("saved at:   {}", session.config.path().display());
        }
        None => println!("No saved connection ({})", session.config.path().display()),
    }
    Ok(0)
}

pub fn run_forget(session: &Session) -> Result<u8> {
    session.config.clear()?;
    println!("OK: removed {}", session.config.path().display());
    Ok(0)
}

fn print_warnings(report: &AccessReport) {
    for warning in report.warnings() {
        eprintln!("WARNING: {warning}");
    }
}

/// Human-readable connection, credential redacted.
fn render_connection(connection: &StoreConnection) -> String {
    let credential = if connection.credential.is_some() {
        "[REDACTED]"
    } else {
        "(none)"
    };
    format!(
        "owner:      {}\ncollection: {}\nbranch:     {}\ncredential: {}\n",
        connection.owner, connection.collection, connection.branch, credential
    )
}
