//! In-memory [`RemoteStore`] backed by `DashMap`.
//!
//! Behaves like the hosted store where it matters to the publish pipeline:
//! conditional writes are atomic compare-and-swap on a per-path token,
//! versioned reads return base64 wrapped at 60 columns, and a create
//! against an existing path is a conflict. Tests use the injection hooks
//! to simulate network failures and writers racing between fetch and
//! commit.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use vitrine_core::{EncodedContent, IntegrityToken};

use crate::error::StoreError;
use crate::remote::{AccessGrant, RemoteFileHandle, RemoteStore, StoreOp, Visibility};

/// Column at which the hosted store wraps base64 content.
const WRAP_COLUMN: usize = 60;

type ReadHook = Box<dyn FnOnce(&MemoryStore) + Send>;

struct StoredFile {
    bytes: Vec<u8>,
    token: IntegrityToken,
}

struct InjectedFailure {
    op: StoreOp,
    path: Option<String>,
    error: StoreError,
}

/// Shared in-memory store. Cheaply cloneable via `Arc`; all clones share
/// the same files.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    files: DashMap<String, StoredFile>,
    failures: Mutex<Vec<InjectedFailure>>,
    read_hook: Mutex<Option<ReadHook>>,
    public_read_hook: Mutex<Option<ReadHook>>,
    visibility: Mutex<Visibility>,
    access_denied: AtomicBool,
    read_only: AtomicBool,
    writes: AtomicUsize,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("files", &self.inner.files.len())
            .field("writes", &self.write_count())
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                files: DashMap::new(),
                failures: Mutex::new(Vec::new()),
                read_hook: Mutex::new(None),
                public_read_hook: Mutex::new(None),
                visibility: Mutex::new(Visibility::Public),
                access_denied: AtomicBool::new(false),
                read_only: AtomicBool::new(false),
                writes: AtomicUsize::new(0),
            }),
        }
    }

    /// Write `bytes` unconditionally, as an out-of-band writer would.
    pub fn put_raw(&self, path: &str, bytes: impl Into<Vec<u8>>) -> IntegrityToken {
        let bytes = bytes.into();
        let token = token_for(&bytes);
        self.inner.files.insert(
            path.to_string(),
            StoredFile {
                bytes,
                token: token.clone(),
            },
        );
        token
    }

    /// Current bytes at `path`.
    pub fn raw(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.files.get(path).map(|f| f.bytes.clone())
    }

    /// Current integrity token at `path`.
    pub fn token(&self, path: &str) -> Option<IntegrityToken> {
        self.inner.files.get(path).map(|f| f.token.clone())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.files.contains_key(path)
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.inner.files.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Number of successful conditional writes.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Fail the next call of `op` (any path) with `error`.
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.inner.failures.lock().push(InjectedFailure {
            op,
            path: None,
            error,
        });
    }

    /// Fail the next call of `op` on exactly `path` with `error`.
    pub fn fail_next_at(&self, op: StoreOp, path: &str, error: StoreError) {
        self.inner.failures.lock().push(InjectedFailure {
            op,
            path: Some(path.to_string()),
            error,
        });
    }

    /// Run `hook` once, right after the next versioned read returns its
    /// result. Used to commit a competing write between a writer's fetch
    /// and its commit.
    pub fn after_next_versioned_read(&self, hook: impl FnOnce(&MemoryStore) + Send + 'static) {
        *self.inner.read_hook.lock() = Some(Box::new(hook));
    }

    /// Run `hook` once, right after the next public read has taken its
    /// bytes and before it returns them.
    pub fn after_next_public_read(&self, hook: impl FnOnce(&MemoryStore) + Send + 'static) {
        *self.inner.public_read_hook.lock() = Some(Box::new(hook));
    }

    pub fn set_visibility(&self, visibility: Visibility) {
        *self.inner.visibility.lock() = visibility;
    }

    /// Make access probes fail with `Auth`.
    pub fn deny_access(&self) {
        self.inner.access_denied.store(true, Ordering::SeqCst);
    }

    /// Make access probes report a read-only grant.
    pub fn set_read_only(&self, read_only: bool) {
        self.inner.read_only.store(read_only, Ordering::SeqCst);
    }

    fn take_failure(&self, op: StoreOp, path: Option<&str>) -> Result<(), StoreError> {
        let mut failures = self.inner.failures.lock();
        let position = failures.iter().position(|f| {
            f.op == op && (f.path.is_none() || f.path.as_deref() == path)
        });
        match position {
            Some(i) => Err(failures.remove(i).error),
            None => Ok(()),
        }
    }

    fn versioned_read(&self, path: &str) -> Option<RemoteFileHandle> {
        self.inner.files.get(path).map(|file| RemoteFileHandle {
            content: wrap(&EncodedContent::from_bytes(&file.bytes)),
            integrity_token: file.token.clone(),
        })
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn public_url(&self, path: &str) -> String {
        format!("memory:///{path}")
    }

    async fn read_public(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.take_failure(StoreOp::ReadPublic, Some(path))?;
        let bytes = self.raw(path);
        let hook = self.inner.public_read_hook.lock().take();
        if let Some(hook) = hook {
            hook(self);
        }
        Ok(bytes)
    }

    async fn read_versioned(&self, path: &str) -> Result<Option<RemoteFileHandle>, StoreError> {
        self.take_failure(StoreOp::ReadVersioned, Some(path))?;
        // The map guard must be released before the hook writes.
        let handle = self.versioned_read(path);
        let hook = self.inner.read_hook.lock().take();
        if let Some(hook) = hook {
            hook(self);
        }
        Ok(handle)
    }

    async fn conditional_write(
        &self,
        path: &str,
        content: &EncodedContent,
        message: &str,
        expected: Option<&IntegrityToken>,
    ) -> Result<IntegrityToken, StoreError> {
        self.take_failure(StoreOp::Write, Some(path))?;
        let bytes = content.decode()?;
        let token = token_for(&bytes);
        let conflict = || StoreError::Conflict {
            path: path.to_string(),
        };

        match self.inner.files.entry(path.to_string()) {
            Entry::Occupied(mut current) => match expected {
                Some(t) if *t == current.get().token => {
                    current.insert(StoredFile {
                        bytes,
                        token: token.clone(),
                    });
                }
                _ => return Err(conflict()),
            },
            Entry::Vacant(slot) => match expected {
                None => {
                    slot.insert(StoredFile {
                        bytes,
                        token: token.clone(),
                    });
                }
                Some(_) => return Err(conflict()),
            },
        }

        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(path, message, token = %token, "memory store write");
        Ok(token)
    }

    async fn check_access(&self) -> Result<AccessGrant, StoreError> {
        self.take_failure(StoreOp::CheckAccess, None)?;
        if self.inner.access_denied.load(Ordering::SeqCst) {
            return Err(StoreError::Auth {
                endpoint: "memory".into(),
                message: "access denied".into(),
            });
        }
        Ok(AccessGrant {
            can_write: !self.inner.read_only.load(Ordering::SeqCst),
        })
    }

    async fn visibility(&self) -> Result<Visibility, StoreError> {
        self.take_failure(StoreOp::Visibility, None)?;
        Ok(*self.inner.visibility.lock())
    }
}

fn token_for(bytes: &[u8]) -> IntegrityToken {
    let digest = Sha256::digest(bytes);
    IntegrityToken::new(digest.iter().map(|b| format!("{b:02x}")).collect::<String>())
}

fn wrap(content: &EncodedContent) -> EncodedContent {
    let mut wrapped = String::with_capacity(content.len() + content.len() / WRAP_COLUMN + 1);
    for chunk in content.as_str().as_bytes().chunks(WRAP_COLUMN) {
        // Base64 is ASCII, so every chunk boundary is a char boundary.
        wrapped.push_str(&String::from_utf8_lossy(chunk));
        wrapped.push('\n');
    }
    EncodedContent::from_wire(wrapped)
}
