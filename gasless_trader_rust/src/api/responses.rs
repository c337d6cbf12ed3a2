use gasless_models::models::trade::{ApprovalObject, TradeKind, TradeObject, TradeStatus};
use serde::{Deserialize, Serialize};

/// Pre-flight problems the API detected for the taker. Informational; a
/// quote with an `allowance` issue is exactly the case gasless approvals
/// exist for.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenIssues {
    #[serde(default)]
    pub allowance: Option<AllowanceIssue>,
    #[serde(default)]
    pub balance: Option<BalanceIssue>,
    #[serde(default)]
    pub simulation_incomplete: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceIssue {
    pub actual: String,
    pub spender: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceIssue {
    pub token: String,
    pub actual: String,
    pub expected: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GaslessPriceResponse {
    pub liquidity_available: bool,
    #[serde(default)]
    pub buy_amount: Option<String>,
    #[serde(default)]
    pub min_buy_amount: Option<String>,
    #[serde(default)]
    pub sell_amount: Option<String>,
    #[serde(default)]
    pub issues: Option<TokenIssues>,
    #[serde(default)]
    pub zid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GaslessQuoteResponse {
    pub liquidity_available: bool,
    /// Present only when the sell token supports a gasless approval and the
    /// taker still needs one.
    #[serde(default)]
    pub approval: Option<ApprovalObject>,
    /// Present whenever liquidity is available.
    #[serde(default)]
    pub trade: Option<TradeObject>,
    #[serde(default)]
    pub buy_amount: Option<String>,
    #[serde(default)]
    pub min_buy_amount: Option<String>,
    #[serde(default)]
    pub issues: Option<TokenIssues>,
    #[serde(default)]
    pub zid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GaslessSubmitResponse {
    pub trade_hash: String,
    #[serde(rename = "type", default)]
    pub kind: Option<TradeKind>,
    #[serde(default)]
    pub zid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransaction {
    pub hash: String,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GaslessStatusResponse {
    pub status: TradeStatus,
    #[serde(default)]
    pub transactions: Vec<StatusTransaction>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub zid: Option<String>,
}
