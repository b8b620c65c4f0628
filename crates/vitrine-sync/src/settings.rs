//! Local connection record.
//!
//! One JSON file holding the [`StoreConnection`] under a fixed key. The
//! record includes the credential, so the file is created owner-only on
//! Unix. Saves go through a sibling temp file and a rename, so a crash
//! mid-write leaves either the old record or the new one.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use vitrine_store::StoreConnection;

use crate::error::ConfigStoreError;

/// Key the connection is stored under.
pub const CONNECTION_KEY: &str = "vitrine.connection";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "VITRINE_CONFIG";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$VITRINE_CONFIG`, else `$HOME/.config/vitrine/connection.json`.
    pub fn default_location() -> Result<Self, ConfigStoreError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Ok(Self::new(path));
        }
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or(ConfigStoreError::NoLocation)?;
        Ok(Self::new(
            PathBuf::from(home)
                .join(".config")
                .join("vitrine")
                .join("connection.json"),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved connection, or `None` if nothing has been saved.
    pub fn load(&self) -> Result<Option<StoreConnection>, ConfigStoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io(e)),
        };
        let mut record: BTreeMap<String, StoreConnection> =
            serde_json::from_slice(&bytes).map_err(|e| self.json(e))?;
        let Some(connection) = record.remove(CONNECTION_KEY) else {
            return Ok(None);
        };
        connection.validate()?;
        Ok(Some(connection))
    }

    pub fn save(&self, connection: &StoreConnection) -> Result<(), ConfigStoreError> {
        connection.validate()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io(e))?;
        }

        let record = BTreeMap::from([(CONNECTION_KEY, connection)]);
        let mut body = serde_json::to_vec_pretty(&record).map_err(|e| self.json(e))?;
        body.push(b'\n');

        let tmp = self.temp_path();
        let written = write_private(&tmp, &body).and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(self.io(e));
        }
        tracing::debug!(path = %self.path.display(), "connection saved");
        Ok(())
    }

    /// Remove the saved connection. Clearing an absent record succeeds.
    pub fn clear(&self) -> Result<(), ConfigStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io(e)),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "connection.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io(&self, source: std::io::Error) -> ConfigStoreError {
        ConfigStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json(&self, source: serde_json::Error) -> ConfigStoreError {
        ConfigStoreError::Json {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(body)?;
    file.sync_all()
}
