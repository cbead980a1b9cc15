use std::borrow::Cow;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tezos_multisig_coordinator_engine::{ErrorCode, MultisigEngineError, request::RequestError};

#[derive(Debug, thiserror::Error)]
pub(crate) enum AppError {
    #[error("multisig engine error: {0}")]
    MultisigEngine(Box<MultisigEngineError>),

    #[error("request error: {0}")]
    RequestError(#[from] RequestError),

    #[error("invalid {0}")]
    InvalidParam(&'static str),

    #[allow(dead_code)]
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl AppError {
    #[allow(dead_code)]
    pub fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }

    fn code(&self) -> ErrorCode {
        match self {
            AppError::MultisigEngine(err) => err.code(),
            AppError::RequestError(_) | AppError::InvalidParam(_) => ErrorCode::BadParam,
            AppError::Other(_) => ErrorCode::Service,
        }
    }

    fn value(&self) -> Option<&str> {
        match self {
            AppError::MultisigEngine(err) => err.value(),
            AppError::RequestError(RequestError::ContractStorage(err)) => Some(err.field()),
            AppError::RequestError(RequestError::VestingStorage(err)) => Some(err.field()),
            AppError::InvalidParam(field) => Some(*field),
            AppError::Other(_) => None,
        }
    }
}

impl From<MultisigEngineError> for AppError {
    fn from(err: MultisigEngineError) -> Self {
        Self::MultisigEngine(err.into())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();

        let status = match code {
            ErrorCode::Service => {
                tracing::error!("server error: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            },
            _ => {
                tracing::warn!("client error: {self}");
                StatusCode::BAD_REQUEST
            },
        };

        let body = ErrorBody { error: code.into(), value: self.value() };

        (status, Json(body)).into_response()
    }
}
