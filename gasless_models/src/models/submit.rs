use error_stack::report;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ModelResult};
use crate::models::signature::SplitSignature;
use crate::models::trade::{ApprovalKind, ApprovalObject, TradeKind, TradeObject};
use crate::models::typed_data::Eip712TypedData;

/// Approval half of the submit payload: the quote's original EIP-712 object
/// paired with its split signature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignedApproval {
    #[serde(rename = "type")]
    pub kind: ApprovalKind,
    pub eip712: Eip712TypedData,
    pub signature: SplitSignature,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignedTrade {
    #[serde(rename = "type")]
    pub kind: TradeKind,
    pub eip712: Eip712TypedData,
    pub signature: SplitSignature,
}

/// Wire payload for `POST /gasless/submit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
    pub chain_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval: Option<SignedApproval>,
    pub trade: SignedTrade,
}

/// Assembles the submit payload. Pure; no network I/O.
///
/// The `eip712` objects embedded here are the quote's originals, untouched by
/// canonicalization: the endpoint requires the submitted objects to equal
/// what the quote returned, only the signing step uses the canonical view.
pub fn build_submit_payload(
    chain_id: u64,
    trade: &TradeObject,
    trade_signature: SplitSignature,
    approval: Option<&ApprovalObject>,
    approval_signature: Option<SplitSignature>,
) -> ModelResult<SubmitPayload> {
    let approval = match (approval, approval_signature) {
        (Some(approval), Some(signature)) => Some(SignedApproval {
            kind: approval.kind,
            eip712: approval.eip712.clone(),
            signature,
        }),
        (None, None) => None,
        (Some(_), None) => {
            return Err(report!(Error::IncompleteApprovalBundle(
                "approval object supplied without its signature".to_string()
            )));
        }
        (None, Some(_)) => {
            return Err(report!(Error::IncompleteApprovalBundle(
                "approval signature supplied without its object".to_string()
            )));
        }
    };

    Ok(SubmitPayload {
        chain_id,
        approval,
        trade: SignedTrade {
            kind: trade.kind,
            eip712: trade.eip712.clone(),
            signature: trade_signature,
        },
    })
}
