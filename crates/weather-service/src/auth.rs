//! Authorization gate for write operations.
//!
//! Credential issuance lives outside this service. The service only asks an
//! [`Authorizer`] whether the credential presented with a request may write.

use subtle::ConstantTimeEq;

/// Reasons a credential is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("missing credential")]
    Missing,
    /// The credential is not one of the accepted keys.
    #[error("invalid credential")]
    Invalid,
    /// The server accepts no credentials at all.
    #[error("no API keys configured; writes are disabled")]
    NotConfigured,
}

/// Decides whether a credential may perform writes.
pub trait Authorizer: Send + Sync {
    /// Check `credential`, the raw key taken from the request.
    fn authorize(&self, credential: Option<&str>) -> Result<(), AuthError>;
}

/// Accepts any of a fixed set of API keys.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyAuthorizer {
    keys: Vec<String>,
}

impl ApiKeyAuthorizer {
    /// Create an authorizer accepting `keys`. Empty keys are dropped.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(Into::into)
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Whether any key is configured.
    pub fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }
}

impl Authorizer for ApiKeyAuthorizer {
    fn authorize(&self, credential: Option<&str>) -> Result<(), AuthError> {
        if self.keys.is_empty() {
            return Err(AuthError::NotConfigured);
        }
        let provided = credential.ok_or(AuthError::Missing)?;

        // Compare against every key so timing does not reveal which one matched.
        let matched = self
            .keys
            .iter()
            .fold(0u8, |acc, key| acc | key.as_bytes().ct_eq(provided.as_bytes()).unwrap_u8());

        if matched == 1 {
            Ok(())
        } else {
            Err(AuthError::Invalid)
        }
    }
}
