use std::borrow::Cow;

use strum::{Display, EnumString, IntoStaticStr};
use tezos_multisig_coordinator_store::MultisigStoreError;
use tezos_multisig_michelson::{EntrypointError, MichelsonError};

use crate::chain::ChainError;

pub type Result<T, E = MultisigEngineError> = core::result::Result<T, E>;

/// Stable, client-facing classification of an engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ErrorCode {
    /// Malformed input, or on-chain data of the wrong shape.
    #[strum(serialize = "ERR_BAD_PARAM")]
    BadParam,
    /// A custom payload that is neither Micheline JSON nor forged hex.
    #[strum(serialize = "ERR_BAD_REQUEST")]
    BadRequest,
    /// Unknown contract or operation.
    #[strum(serialize = "ERR_NOT_FOUND")]
    NotFound,
    /// The caller may not act on the resource.
    #[strum(serialize = "ERR_NOT_ALLOWED")]
    NotAllowed,
    /// The resource already exists elsewhere.
    #[strum(serialize = "ERR_ALREADY_EXISTS")]
    AlreadyExists,
    /// Internal failure of the engine or one of its collaborators.
    #[strum(serialize = "ERR_SERVICE")]
    Service,
}

/// Error returned by every [`MultisigEngine`](crate::MultisigEngine) operation.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct MultisigEngineError(#[from] MultisigEngineErrorKind);

impl MultisigEngineError {
    /// Returns the underlying error.
    pub fn kind(&self) -> &MultisigEngineErrorKind {
        &self.0
    }

    /// Returns the client-facing error code.
    pub fn code(&self) -> ErrorCode {
        match &self.0 {
            MultisigEngineErrorKind::BadParam(_) | MultisigEngineErrorKind::WrongContractType(_) => {
                ErrorCode::BadParam
            },
            MultisigEngineErrorKind::BadRequest(_) => ErrorCode::BadRequest,
            MultisigEngineErrorKind::NotFound(_) => ErrorCode::NotFound,
            MultisigEngineErrorKind::NotAllowed(_) => ErrorCode::NotAllowed,
            MultisigEngineErrorKind::AlreadyExists(_) => ErrorCode::AlreadyExists,
            MultisigEngineErrorKind::Chain(_)
            | MultisigEngineErrorKind::Store(_)
            | MultisigEngineErrorKind::Michelson(_)
            | MultisigEngineErrorKind::Other(_) => ErrorCode::Service,
        }
    }

    /// Returns the machine-readable context of a client error, such as the offending field.
    ///
    /// Service errors carry no context so that internal details stay private.
    pub fn value(&self) -> Option<&str> {
        match &self.0 {
            MultisigEngineErrorKind::BadParam(value)
            | MultisigEngineErrorKind::BadRequest(value)
            | MultisigEngineErrorKind::NotFound(value)
            | MultisigEngineErrorKind::NotAllowed(value)
            | MultisigEngineErrorKind::AlreadyExists(value) => Some(value),
            MultisigEngineErrorKind::WrongContractType(_) => Some("wrong contract type"),
            MultisigEngineErrorKind::Chain(_)
            | MultisigEngineErrorKind::Store(_)
            | MultisigEngineErrorKind::Michelson(_)
            | MultisigEngineErrorKind::Other(_) => None,
        }
    }
}

/// The failures an engine operation can run into.
#[derive(Debug, thiserror::Error)]
pub enum MultisigEngineErrorKind {
    /// A request field is malformed or out of range.
    #[error("bad param: {0}")]
    BadParam(Cow<'static, str>),

    /// A custom payload could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(Cow<'static, str>),

    /// The contract or operation is unknown.
    #[error("not found: {0}")]
    NotFound(Cow<'static, str>),

    /// The caller is not permitted to perform the operation.
    #[error("not allowed: {0}")]
    NotAllowed(Cow<'static, str>),

    /// The resource is already recorded against something else.
    #[error("already exists: {0}")]
    AlreadyExists(Cow<'static, str>),

    /// A contract lacks the annotated fields the operation relies on.
    #[error("wrong contract type: {0}")]
    WrongContractType(#[from] EntrypointError),

    /// The node or indexer failed.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// The repository failed.
    #[error("store error: {0}")]
    Store(#[from] MultisigStoreError),

    /// A Micheline value could not be decoded.
    #[error("michelson error: {0}")]
    Michelson(#[from] MichelsonError),

    /// An unclassified internal failure.
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl MultisigEngineErrorKind {
    pub(crate) fn bad_param<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::BadParam(err.into())
    }

    pub(crate) fn bad_request<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::BadRequest(err.into())
    }

    pub(crate) fn not_found<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::NotFound(err.into())
    }

    pub(crate) fn not_allowed<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::NotAllowed(err.into())
    }

    pub(crate) fn already_exists<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::AlreadyExists(err.into())
    }

    pub(crate) fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_expose_code_and_value() {
        let err = MultisigEngineError::from(MultisigEngineErrorKind::bad_param("signature"));
        assert_eq!(err.code(), ErrorCode::BadParam);
        assert_eq!(err.code().to_string(), "ERR_BAD_PARAM");
        assert_eq!(err.value(), Some("signature"));

        let err = MultisigEngineError::from(MultisigEngineErrorKind::WrongContractType(
            EntrypointError::Missing("counter".to_string()),
        ));
        assert_eq!(err.code(), ErrorCode::BadParam);
        assert_eq!(err.value(), Some("wrong contract type"));
    }

    #[test]
    fn service_errors_hide_details() {
        let err = MultisigEngineError::from(MultisigEngineErrorKind::other("connection reset"));
        assert_eq!(err.code(), ErrorCode::Service);
        assert_eq!(<&str>::from(err.code()), "ERR_SERVICE");
        assert_eq!(err.value(), None);
    }
}
