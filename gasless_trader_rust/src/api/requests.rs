use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaslessPriceRequest {
    pub chain_id: u64,
    pub sell_token: String,
    pub buy_token: String,
    /// Base-unit amount, string-encoded like the API expects.
    pub sell_amount: String,
    pub taker: Option<String>,
    pub slippage_bps: Option<u32>, // integer [ 0 .. 10000 ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaslessQuoteRequest {
    pub chain_id: u64,
    pub sell_token: String,
    pub buy_token: String,
    pub sell_amount: String,
    /// Required for quotes: the firm quote's signable objects are bound to
    /// the taker address.
    pub taker: String,
    pub slippage_bps: Option<u32>,
}

impl From<GaslessQuoteRequest> for GaslessPriceRequest {
    fn from(request: GaslessQuoteRequest) -> Self {
        Self {
            chain_id: request.chain_id,
            sell_token: request.sell_token,
            buy_token: request.buy_token,
            sell_amount: request.sell_amount,
            taker: Some(request.taker),
            slippage_bps: request.slippage_bps,
        }
    }
}
