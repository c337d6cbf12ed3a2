use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::typed_data::Eip712TypedData;

/// Gasless approval mechanisms the quote endpoint can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalKind {
    #[serde(rename = "permit")]
    Permit,
    #[serde(rename = "daiPermit")]
    DaiPermit,
    #[serde(rename = "executeMetaTransaction::approve")]
    ExecuteMetaTransactionApprove,
}

/// Settlement paths for the trade object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeKind {
    #[serde(rename = "settler_metatransaction")]
    SettlerMetatransaction,
    #[serde(rename = "settler_intent")]
    SettlerIntent,
}

/// Optional signable approval returned by the quote step. Present only when
/// the sell token supports a gasless allowance mechanism.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalObject {
    #[serde(rename = "type")]
    pub kind: ApprovalKind,
    pub hash: String,
    pub eip712: Eip712TypedData,
}

/// The signable trade object. Present whenever `liquidityAvailable` is true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeObject {
    #[serde(rename = "type")]
    pub kind: TradeKind,
    pub hash: String,
    pub eip712: Eip712TypedData,
}

/// Settlement status reported for a submitted trade hash.
///
/// Statuses advance monotonically `pending -> submitted -> succeeded ->
/// confirmed`, with `failed` absorbing from any non-terminal state. A sparse
/// poller may skip intermediate states entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Submitted,
    Succeeded,
    Confirmed,
    Failed,
}

impl TradeStatus {
    /// `succeeded` is deliberately not terminal: it signals on-chain
    /// inclusion, while `confirmed` signals finality.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeStatus::Confirmed | TradeStatus::Failed)
    }

    /// Whether observing `next` after `self` is a legal lattice step.
    pub fn can_advance_to(&self, next: TradeStatus) -> bool {
        if *self == next {
            return true;
        }
        match next {
            TradeStatus::Failed => !self.is_terminal(),
            _ => !self.is_terminal() && rank(next) > rank(*self),
        }
    }
}

fn rank(status: TradeStatus) -> u8 {
    match status {
        TradeStatus::Pending => 0,
        TradeStatus::Submitted => 1,
        TradeStatus::Succeeded => 2,
        TradeStatus::Confirmed => 3,
        TradeStatus::Failed => 4,
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TradeStatus::Pending => write!(f, "pending"),
            TradeStatus::Submitted => write!(f, "submitted"),
            TradeStatus::Succeeded => write!(f, "succeeded"),
            TradeStatus::Confirmed => write!(f, "confirmed"),
            TradeStatus::Failed => write!(f, "failed"),
        }
    }
}
