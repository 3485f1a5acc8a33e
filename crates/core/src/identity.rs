//! Identity resolution: observation → canonical record key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::UNIQUE_ID_SEPARATOR;
use crate::{IdentityError, Observation};

/// Platform-qualified product identifier, `"{platform}_{product_id}"`.
///
/// Only constructed through [`UniqueId::new`] or [`resolve_identity`], so a
/// value of this type always has both halves non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueId(String);

impl UniqueId {
    /// Build the key for a platform/product pair.
    ///
    /// # Errors
    /// Returns [`IdentityError`] when either half is empty or whitespace.
    pub fn new(platform: &str, product_id: &str) -> Result<Self, IdentityError> {
        if platform.trim().is_empty() {
            return Err(IdentityError::MissingPlatform);
        }
        if product_id.trim().is_empty() {
            return Err(IdentityError::MissingProductId);
        }
        Ok(Self(format!("{platform}{UNIQUE_ID_SEPARATOR}{product_id}")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UniqueId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the canonical key of an observation.
///
/// # Errors
/// Returns [`IdentityError`] if the observation lacks a platform or product id.
pub fn resolve_identity(obs: &Observation) -> Result<UniqueId, IdentityError> {
    UniqueId::new(&obs.platform, &obs.product_id)
}
