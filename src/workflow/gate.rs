use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::{Error, Result};

/// Holds the shared approval secret. Anyone who knows it may approve any
/// expense; there is no per-user identity behind it.
#[derive(Clone, Default)]
pub(crate) struct ApprovalGate {
    secret: Option<String>,
}

impl ApprovalGate {
    /// An empty secret counts as "not configured".
    pub(crate) fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub(crate) fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Constant-time for equal-length inputs.
    pub(crate) fn check(&self, supplied: &str) -> Result<()> {
        let Some(secret) = &self.secret else {
            warn!("Approval rejected: no approval secret configured");
            return Err(Error::Unauthorized);
        };

        let expected = secret.as_bytes();
        let supplied = supplied.as_bytes();
        if expected.len() == supplied.len() && bool::from(expected.ct_eq(supplied)) {
            Ok(())
        } else {
            warn!("Approval rejected: incorrect secret");
            Err(Error::Unauthorized)
        }
    }
}

impl std::fmt::Debug for ApprovalGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}
