//! # vitrine-cli -- The `vitrine` Command
//!
//! Thin layer over `vitrine-sync`. Every subcommand handler returns the
//! process exit code; failures of a publish attempt print the one-line
//! status and exit 1.
//!
//! ## Subcommands
//!
//! - `vitrine configure`: Verify a collection and save the connection.
//! - `vitrine verify`: Re-check the saved connection.
//! - `vitrine publish`: Upload an image and add it to the manifest.
//! - `vitrine list`: Print the published catalog.
//! - `vitrine show-config`: Print the saved connection, credential redacted.
//! - `vitrine forget`: Remove the saved connection.
//!
//! ```bash
//! VITRINE_TOKEN=ghp_... vitrine configure --owner curator --collection gallery
//! vitrine publish harbor.png --title "Harbor" --tag sea --tag dusk
//! vitrine list --json
//! ```

pub mod connection;
pub mod list;
pub mod publish;

use std::path::PathBuf;

use anyhow::{Context, Result};
use vitrine_store::{GitHubStore, StoreConnection, StoreEndpoints};
use vitrine_sync::ConfigStore;

/// What every subcommand needs: where the connection is saved and which
/// hosts to talk to.
#[derive(Debug)]
pub struct Session {
    pub config: ConfigStore,
    pub endpoints: StoreEndpoints,
}

impl Session {
    /// Resolve the config location (explicit path, else the default) and
    /// read endpoint settings from the environment.
    pub fn from_env(config_path: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ConfigStore::new(path),
            None => ConfigStore::default_location()?,
        };
        let endpoints = StoreEndpoints::from_env().context("invalid endpoint configuration")?;
        Ok(Self { config, endpoints })
    }

    /// The saved connection. Fails when nothing has been configured.
    pub fn connection(&self) -> Result<StoreConnection> {
        self.config.load()?.with_context(|| {
            format!(
                "no saved connection at {}; run `vitrine configure` first",
                self.config.path().display()
            )
        })
    }

    pub fn store_for(&self, connection: StoreConnection) -> Result<GitHubStore> {
        Ok(GitHubStore::new(connection, &self.endpoints)?)
    }

    pub fn open_store(&self) -> Result<GitHubStore> {
        self.store_for(self.connection()?)
    }
}
