use thiserror::Error;

/// An observation that cannot be keyed to a product record.
///
/// Raised before any storage access; the observation produces no record.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    #[error("missing identity: observation has no platform")]
    MissingPlatform,

    #[error("missing identity: observation has no product_id")]
    MissingProductId,
}
