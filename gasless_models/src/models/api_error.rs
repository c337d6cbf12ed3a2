use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Error codes the API reports in the `name` field of its error payload.
/// Branching happens on these, never on the human-readable `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    InputInvalid,
    InsufficientBalanceOrAllowance,
    InvalidSignature,
    InvalidSigner,
    MetaTransactionExpiryTooSoon,
    MetaTransactionInvalid,
    SwapValidationFailed,
    TakerNotAuthorizedForTrade,
    PendingTradeAlreadyExists,
    TokenNotSupported,
    #[strum(default)]
    Other(String),
}

/// Documented error payload: `{ name, message, data: { zid, details } }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ErrorDetail>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetail {
    pub field: String,
    pub reason: String,
}

impl ErrorResponse {
    pub fn code(&self) -> ApiErrorCode {
        self.name
            .parse()
            .unwrap_or_else(|_| ApiErrorCode::Other(self.name.clone()))
    }

    /// Request correlation id, kept on every surfaced error for support
    /// escalation.
    pub fn zid(&self) -> Option<&str> {
        self.data.as_ref().and_then(|data| data.zid.as_deref())
    }
}
