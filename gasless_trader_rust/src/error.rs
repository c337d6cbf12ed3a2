use error_stack::{AttachmentKind, FrameKind, Report};
use gasless_models::models::api_error::ApiErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type TraderResult<T> = error_stack::Result<T, Error>;

#[derive(Error, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error")]
    ParseError,

    #[error("Reqwest error")]
    ReqwestError,

    #[error("Models error")]
    ModelsError,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No liquidity available for this pair")]
    NoLiquidity,

    #[error("Quote validity window elapsed before signing")]
    QuoteExpired,

    #[error("Signer declined the signature request")]
    UserRejected,

    #[error("Signer unavailable: {0}")]
    SignerUnavailable(String),

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        zid: Option<String>,
    },

    /// HTTP 429 from the submit endpoint: a trade is already outstanding for
    /// this taker and sell token. Retrying would duplicate trades.
    #[error("Pending trade already exists: {message}")]
    PendingTradeConflict {
        message: String,
        zid: Option<String>,
    },

    #[error("Remote validation failed ({code}): {message}")]
    Remote {
        code: ApiErrorCode,
        message: String,
        zid: Option<String>,
    },

    #[error("Rate limited by API")]
    RateLimited,

    #[error("Server error: HTTP {0}")]
    ServerError(u16),

    /// Status endpoint 404: the trade hash is not indexed yet. The poller
    /// treats this as `pending`.
    #[error("Trade hash not indexed yet")]
    NotIndexed,

    /// We stopped watching; the trade itself may still settle. Distinct from
    /// an observed `failed` status.
    #[error("Polling deadline exceeded")]
    PollTimeout,

    #[error("Cancelled by caller")]
    Cancelled,

    #[error("Unknown error")]
    Unknown,
}

impl Error {
    /// Failures worth retrying with bounded backoff. Everything else either
    /// needs fresh caller action or would reproduce the same result.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::ReqwestError | Error::RateLimited | Error::ServerError(_)
        )
    }
}

pub trait ReportDisplayExt {
    fn format(&self) -> String;
}

impl ReportDisplayExt for Report<Error> {
    fn format(&self) -> String {
        let mut output = String::new();

        for frame in self.current_frames() {
            if let FrameKind::Attachment(AttachmentKind::Printable(attachment)) = frame.kind() {
                output.push_str(&format!(" {attachment} "));
            }
        }

        output.trim().to_string()
    }
}
