//! Credential resolution for channel publishing
//!
//! Secrets come from two competing sources with a defined precedence: the
//! workspace vault (encrypted rows, slug-keyed) first, then the
//! process-level configuration table. A vault row that fails to decrypt is
//! skipped with a diagnostic, never surfaced as an error; the caller sees
//! the slug as simply absent and treats it as "not configured".

use std::collections::HashMap;
use tracing::warn;

use crate::db::Database;
use crate::error::Result;
use crate::vault::SecretCipher;

/// Resolves channel-scoped secrets for one workspace.
pub struct CredentialResolver {
    db: Database,
    cipher: Option<SecretCipher>,
    fallback: HashMap<String, String>,
}

impl CredentialResolver {
    pub fn new(
        db: Database,
        cipher: Option<SecretCipher>,
        fallback: HashMap<String, String>,
    ) -> Self {
        Self {
            db,
            cipher,
            fallback,
        }
    }

    /// Resolve all secrets for a workspace whose slug starts with one of the
    /// given prefixes.
    ///
    /// Decryption is attempted per row; failures skip the row. Without a
    /// configured vault key the vault layer resolves to nothing and every
    /// lookup falls through to process configuration.
    pub async fn resolve(
        &self,
        workspace_id: &str,
        prefixes: &[&str],
    ) -> Result<ResolvedCredentials> {
        let mut values = HashMap::new();

        if !prefixes.is_empty() {
            match &self.cipher {
                Some(cipher) => {
                    let rows = self.db.list_active_secrets(workspace_id, prefixes).await?;
                    for row in rows {
                        match cipher.decrypt(&row) {
                            Ok(plaintext) => {
                                values.insert(row.slug, plaintext);
                            }
                            Err(e) => {
                                warn!(
                                    workspace = workspace_id,
                                    slug = %row.slug,
                                    "Skipping undecryptable vault secret: {}",
                                    e
                                );
                            }
                        }
                    }
                }
                None => {
                    warn!(
                        workspace = workspace_id,
                        "No vault key configured; resolving from process configuration only"
                    );
                }
            }
        }

        Ok(ResolvedCredentials::new(values, self.fallback.clone()))
    }

    /// Credentials backed by process configuration alone. Used for channels
    /// that require no vault lookup.
    pub fn fallback_only(&self) -> ResolvedCredentials {
        ResolvedCredentials::from_fallback(self.fallback.clone())
    }
}

/// Per-dispatch, ephemeral slug-to-value mapping. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct ResolvedCredentials {
    vault: HashMap<String, String>,
    fallback: HashMap<String, String>,
}

impl ResolvedCredentials {
    pub fn new(vault: HashMap<String, String>, fallback: HashMap<String, String>) -> Self {
        Self { vault, fallback }
    }

    pub fn from_fallback(fallback: HashMap<String, String>) -> Self {
        Self {
            vault: HashMap::new(),
            fallback,
        }
    }

    /// Look up one logical configuration value: the vault mapping under the
    /// canonical slug first, then the process-level key. Empty strings count
    /// as absent.
    pub fn get(&self, slug: &str) -> Option<&str> {
        self.vault
            .get(slug)
            .or_else(|| self.fallback.get(slug))
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Number of decrypted vault entries (diagnostics only).
    pub fn vault_len(&self) -> usize {
        self.vault.len()
    }
}
