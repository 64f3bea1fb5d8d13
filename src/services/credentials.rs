//! Access token resolution.
//!
//! An access token is either the secret itself or a reference of the form
//! `id:<credential-id>` that must be looked up in a credential store.

use std::collections::HashMap;

use crate::error::{AppError, AppResult};

/// Prefix marking a token as a credential reference
pub const CREDENTIAL_REFERENCE_PREFIX: &str = "id:";

/// Environment variable prefix used by [`EnvCredentialStore`]
pub const CREDENTIAL_ENV_PREFIX: &str = "HOWTANK_CREDENTIAL_";

/// Source of secrets addressed by credential id
pub trait CredentialResolver: Send + Sync {
    /// Returns the plaintext secret for `id`, if known
    fn lookup(&self, id: &str) -> Option<String>;
}

/// In-memory credential store, typically loaded from the config file
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    secrets: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(secrets: HashMap<String, String>) -> Self {
        Self { secrets }
    }

    pub fn with_secret(mut self, id: &str, secret: &str) -> Self {
        self.secrets.insert(id.to_string(), secret.to_string());
        self
    }
}

impl CredentialResolver for CredentialStore {
    fn lookup(&self, id: &str) -> Option<String> {
        self.secrets.get(id).cloned()
    }
}

/// Reads secrets from `HOWTANK_CREDENTIAL_<ID>` environment variables
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialStore;

impl EnvCredentialStore {
    /// Environment variable holding the credential `id`
    pub fn variable_name(id: &str) -> String {
        let suffix: String = id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", CREDENTIAL_ENV_PREFIX, suffix)
    }
}

impl CredentialResolver for EnvCredentialStore {
    fn lookup(&self, id: &str) -> Option<String> {
        std::env::var(Self::variable_name(id))
            .ok()
            .filter(|secret| !secret.is_empty())
    }
}

/// Asks each resolver in turn; the first hit wins
#[derive(Default)]
pub struct ChainedResolver {
    resolvers: Vec<Box<dyn CredentialResolver>>,
}

impl ChainedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: impl CredentialResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl CredentialResolver for ChainedResolver {
    fn lookup(&self, id: &str) -> Option<String> {
        self.resolvers.iter().find_map(|resolver| resolver.lookup(id))
    }
}

/// Turns a configured access token into the plaintext bearer token.
///
/// Tokens without the `id:` prefix are returned verbatim.
pub fn resolve_access_token(token: &str, resolver: &dyn CredentialResolver) -> AppResult<String> {
    let Some(id) = token.strip_prefix(CREDENTIAL_REFERENCE_PREFIX) else {
        return Ok(token.to_string());
    };

    if id.is_empty() {
        return Err(AppError::CredentialResolution(
            "Credential reference has no id".to_string(),
        ));
    }

    resolver
        .lookup(id)
        .ok_or_else(|| AppError::CredentialResolution(format!("Credential '{}' not found", id)))
}
