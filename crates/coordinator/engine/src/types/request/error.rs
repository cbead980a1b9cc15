use std::borrow::Cow;

/// Top-level error for request validation.
///
/// This enum wraps all possible request validation errors.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Error building a contract storage request.
    #[error("contract storage error: {0}")]
    ContractStorage(#[from] ContractStorageRequestError),

    /// Error building a vesting storage request.
    #[error("vesting storage error: {0}")]
    VestingStorage(#[from] VestingStorageRequestError),
}

/// Errors that can occur when validating an owner set for a new or updated multisig.
#[derive(Debug, thiserror::Error)]
pub enum ContractStorageRequestError {
    /// The owner list is empty
    #[error("empty addresses error")]
    EmptyAddresses,

    /// The threshold is zero
    #[error("zero threshold error")]
    ZeroThreshold,

    /// The threshold exceeds the number of owners
    #[error("excess threshold error: threshold exceeds number of addresses")]
    ExcessThreshold,

    /// More owners than a multisig may hold
    #[error("too many addresses error: at most {0} are allowed")]
    TooManyAddresses(usize),

    /// Other validation error
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl ContractStorageRequestError {
    /// Name of the request field the error is about.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyAddresses | Self::TooManyAddresses(_) | Self::Other(_) => "addresses",
            Self::ZeroThreshold | Self::ExcessThreshold => "threshold",
        }
    }

    pub(crate) fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }
}

/// Errors that can occur when validating a vesting contract origination request.
#[derive(Debug, thiserror::Error)]
pub enum VestingStorageRequestError {
    /// A tick must last at least one second
    #[error("zero seconds per tick error")]
    ZeroSecondsPerTick,

    /// A tick must release at least one mutez
    #[error("zero tokens per tick error")]
    ZeroTokensPerTick,
}

impl VestingStorageRequestError {
    /// Name of the request field the error is about.
    pub fn field(&self) -> &'static str {
        match self {
            Self::ZeroSecondsPerTick => "seconds_per_tick",
            Self::ZeroTokensPerTick => "tokens_per_tick",
        }
    }
}
