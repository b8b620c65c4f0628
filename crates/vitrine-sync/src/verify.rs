//! Access verification before publishing is enabled.
//!
//! `verify` fails closed: any error, or a grant without write permission,
//! is `false`. Visibility is best-effort and never blocks saving a
//! connection; it only produces warnings.

use vitrine_store::{RemoteStore, StoreError, Visibility};

/// Combined outcome of the access and visibility probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReport {
    pub writable: bool,
    pub visibility: Visibility,
    /// Why `writable` is false, when a probe error explains it.
    pub failure: Option<String>,
}

impl AccessReport {
    /// Operational warnings for the curator. Empty when all is well.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.writable {
            warnings.push(match &self.failure {
                Some(reason) => format!("Credential cannot publish: {reason}"),
                None => "Credential can read but not write to this collection".to_string(),
            });
        }
        match self.visibility {
            Visibility::Private => warnings.push(
                "Collection is private: the public gallery cannot read the manifest or images"
                    .to_string(),
            ),
            Visibility::Unknown => {
                warnings.push("Could not determine collection visibility".to_string())
            }
            Visibility::Public => {}
        }
        warnings
    }
}

pub struct AccessVerifier;

impl AccessVerifier {
    /// Whether the store's credential can write to the collection.
    pub async fn verify<S: RemoteStore + ?Sized>(store: &S) -> bool {
        match store.check_access().await {
            Ok(grant) => grant.can_write,
            Err(e) => {
                tracing::warn!(error = %e, "access check failed");
                false
            }
        }
    }

    /// Collection visibility, or `Unknown` if the probe fails.
    pub async fn inspect_visibility<S: RemoteStore + ?Sized>(store: &S) -> Visibility {
        or_unknown(store.visibility().await)
    }

    /// Access and visibility from a single inspection. Visibility is
    /// read on its own only when the access check itself failed.
    pub async fn report<S: RemoteStore + ?Sized>(store: &S) -> AccessReport {
        match store.inspect_access().await {
            Ok((grant, visibility)) => AccessReport {
                writable: grant.can_write,
                visibility: or_unknown(visibility),
                failure: None,
            },
            Err(e) => AccessReport {
                writable: false,
                visibility: Self::inspect_visibility(store).await,
                failure: Some(e.to_string()),
            },
        }
    }
}

fn or_unknown(visibility: Result<Visibility, StoreError>) -> Visibility {
    visibility.unwrap_or_else(|e| {
        tracing::debug!(error = %e, "visibility probe failed");
        Visibility::Unknown
    })
}
