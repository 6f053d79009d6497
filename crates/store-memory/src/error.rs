use natsmesh_store::MembershipStoreError;
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error)]
#[error("store error")]
pub struct Error;

impl MembershipStoreError for Error {}
