use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::api_error::ApiErrorCode;

pub type ModelResult<T> = error_stack::Result<T, Error>;

#[derive(Error, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error")]
    ParseError,

    #[error("Logic error: {0}")]
    LogicError(String),

    #[error("Serde serialize error: {0}")]
    SerdeSerialize(String),

    #[error("Serde deserialize error: {0}")]
    SerdeDeserialize(String),

    #[error("Reqwest error: {0}")]
    ReqwestError(String),

    /// Non-success HTTP response with the documented 0x error payload
    /// parsed out of the body where possible.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: ApiErrorCode,
        message: String,
        zid: Option<String>,
    },

    #[error("Malformed typed data: {0}")]
    MalformedTypedData(String),

    #[error("Invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),

    #[error("Non-canonical signature: s exceeds half the curve order")]
    NonCanonicalSignature,

    #[error("Incomplete approval bundle: {0}")]
    IncompleteApprovalBundle(String),
}
