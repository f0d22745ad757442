use crate::core::config::defaults::CREDENTIAL_ENV_VAR;
use crate::error::BridgeError;
use std::fmt;

/// Bearer token forwarded to every upstream call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Where the credential comes from.
///
/// The environment is consulted on every call rather than at startup, so a
/// missing token only fails the request that needs it.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Environment { var: String },
    Fixed(Credential),
}

impl Default for CredentialSource {
    fn default() -> Self {
        CredentialSource::Environment {
            var: CREDENTIAL_ENV_VAR.to_string(),
        }
    }
}

impl CredentialSource {
    pub fn resolve(&self) -> Result<Credential, BridgeError> {
        match self {
            CredentialSource::Fixed(credential) => Ok(credential.clone()),
            CredentialSource::Environment { var } => std::env::var(var)
                .ok()
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
                .map(Credential)
                .ok_or_else(|| BridgeError::MissingCredential { var: var.clone() }),
        }
    }
}
