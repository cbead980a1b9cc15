use std::borrow::Cow;

use crate::persistence::store::StoreError;

pub type Result<T, E = MultisigStoreError> = core::result::Result<T, E>;

/// Errors that can occur when interacting with the store
#[derive(Debug, thiserror::Error)]
pub enum MultisigStoreError {
    /// A query or transaction failed, or a unique index rejected a concurrent insert.
    #[error("database error: {0}")]
    Store(#[from] StoreError),

    /// The requested resource was not found in the database.
    ///
    /// This is returned when updating entities that don't exist,
    /// such as unknown request hashes or contract addresses.
    #[error("not found error: {0}")]
    NotFound(Cow<'static, str>),

    /// A serialization or deserialization error occurred.
    ///
    /// This is returned when converting action info to or from its JSON column fails.
    #[error("serialization error: {0}")]
    Serialization(Cow<'static, str>),

    /// Failed to acquire a database connection from the pool.
    ///
    /// This typically indicates the connection pool is exhausted or
    /// the database is unavailable.
    #[error("pool error")]
    Pool,

    /// An invalid value was encountered during processing.
    ///
    /// This is returned when data retrieved from the database cannot be
    /// converted to the expected type or format, such as a negative counter
    /// or a malformed address.
    #[error("invalid value error")]
    InvalidValue,

    /// An unclassified error occurred.
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl MultisigStoreError {
    /// Builds an [`MultisigStoreError::Other`] from any string-like message.
    pub fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(From::from(err))
    }
}

impl From<serde_json::Error> for MultisigStoreError {
    fn from(err: serde_json::Error) -> Self {
        MultisigStoreError::Serialization(err.to_string().into())
    }
}

impl From<diesel::result::Error> for MultisigStoreError {
    fn from(err: diesel::result::Error) -> Self {
        MultisigStoreError::Store(StoreError::from(err))
    }
}
