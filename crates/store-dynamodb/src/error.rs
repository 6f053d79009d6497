use natsmesh_store::MembershipStoreError;
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A scanned row is missing an attribute or holds one of the wrong type.
    #[error("malformed row for key '{0}': {1}")]
    MalformedRow(String, &'static str),

    /// The underlying DynamoDB call failed.
    #[error(transparent)]
    DynamoDb(#[from] aws_sdk_dynamodb::Error),
}

impl MembershipStoreError for Error {}
