//! End-to-end flow tests over scripted API and signer doubles.

use async_trait::async_trait;
use error_stack::report;
use gasless_models::models::signature::Signature65;
use gasless_models::models::submit::SubmitPayload;
use gasless_models::models::trade::TradeStatus;
use gasless_models::models::typed_data::Eip712TypedData;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::api::GaslessApi;
use crate::api::requests::{GaslessPriceRequest, GaslessQuoteRequest};
use crate::api::responses::{
    GaslessPriceResponse, GaslessQuoteResponse, GaslessStatusResponse, GaslessSubmitResponse,
};
use crate::error::{Error, TraderResult};
use crate::orchestrator::{FlowConfig, FlowOutcome, FlowState, GaslessFlow};
use crate::poller::{PollOptions, poll_trade_status};
use crate::signer::TradeSigner;

const CHAIN_ID: u64 = 8453;
const TRADE_HASH: &str = "0x3cf4a6d7a5d2b456b8b3a8a1a0b38f0e6a3e96c71b7c7a1a9a4a2f1c0d9e8b7a";
const TAKER: &str = "0x9ecdc9af2a8254dde8bbce8778efae695044cc9f";

/// One scripted answer from the status endpoint. An exhausted script keeps
/// answering `pending`, which is what the timeout tests rely on.
enum StatusScript {
    Observed(TradeStatus),
    NotIndexed,
    Transport,
}

struct MockApi {
    quote_response: GaslessQuoteResponse,
    submit_error: Option<Error>,
    statuses: Mutex<VecDeque<StatusScript>>,
    status_calls: AtomicUsize,
    submitted: Mutex<Vec<SubmitPayload>>,
}

impl MockApi {
    fn new(quote_response: GaslessQuoteResponse, statuses: Vec<StatusScript>) -> Self {
        Self {
            quote_response,
            submit_error: None,
            statuses: Mutex::new(statuses.into()),
            status_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn with_submit_error(mut self, error: Error) -> Self {
        self.submit_error = Some(error);
        self
    }

    fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn submitted_payloads(&self) -> Vec<SubmitPayload> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl GaslessApi for MockApi {
    async fn price(&self, _request: &GaslessPriceRequest) -> TraderResult<GaslessPriceResponse> {
        Ok(GaslessPriceResponse {
            liquidity_available: self.quote_response.liquidity_available,
            buy_amount: self.quote_response.buy_amount.clone(),
            min_buy_amount: self.quote_response.min_buy_amount.clone(),
            sell_amount: Some("1000000".to_string()),
            issues: None,
            zid: None,
        })
    }

    async fn quote(&self, _request: &GaslessQuoteRequest) -> TraderResult<GaslessQuoteResponse> {
        Ok(self.quote_response.clone())
    }

    async fn submit(&self, payload: &SubmitPayload) -> TraderResult<GaslessSubmitResponse> {
        if let Some(error) = &self.submit_error {
            return Err(report!(error.clone()));
        }

        self.submitted.lock().unwrap().push(payload.clone());
        Ok(GaslessSubmitResponse {
            trade_hash: TRADE_HASH.to_string(),
            kind: None,
            zid: Some("0xsubmit".to_string()),
        })
    }

    async fn status(
        &self,
        _trade_hash: &str,
        _chain_id: u64,
    ) -> TraderResult<GaslessStatusResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let script = self.statuses.lock().unwrap().pop_front();
        match script {
            Some(StatusScript::NotIndexed) => Err(report!(Error::NotIndexed)),
            Some(StatusScript::Transport) => Err(report!(Error::ReqwestError)),
            Some(StatusScript::Observed(status)) => Ok(GaslessStatusResponse {
                status,
                transactions: Vec::new(),
                reason: None,
                zid: None,
            }),
            None => Ok(GaslessStatusResponse {
                status: TradeStatus::Pending,
                transactions: Vec::new(),
                reason: None,
                zid: None,
            }),
        }
    }
}

/// Signs everything with a fixed canonical signature and records the primary
/// type of each request, in order.
struct MockSigner {
    signed_primary_types: Mutex<Vec<String>>,
}

impl MockSigner {
    fn new() -> Self {
        Self {
            signed_primary_types: Mutex::new(Vec::new()),
        }
    }

    fn signed_primary_types(&self) -> Vec<String> {
        self.signed_primary_types.lock().unwrap().clone()
    }
}

#[async_trait]
impl TradeSigner for MockSigner {
    fn address(&self) -> String {
        TAKER.to_string()
    }

    async fn sign_typed_data(&self, typed_data: &Eip712TypedData) -> TraderResult<Signature65> {
        self.signed_primary_types
            .lock()
            .unwrap()
            .push(typed_data.primary_type.clone());

        // r = 1, s = 1, v = 27: in range and low-s.
        let mut bytes = [0u8; 65];
        bytes[31] = 1;
        bytes[63] = 1;
        bytes[64] = 27;
        Ok(Signature65(bytes))
    }
}

fn trade_only_quote() -> GaslessQuoteResponse {
    serde_json::from_value(json!({
        "liquidityAvailable": true,
        "buyAmount": "1228355180061",
        "minBuyAmount": "1216071628260",
        "trade": {
            "type": "settler_metatransaction",
            "hash": TRADE_HASH,
            "eip712": {
                "types": {
                    "EIP712Domain": [
                        { "name": "name", "type": "string" },
                        { "name": "chainId", "type": "uint256" },
                        { "name": "verifyingContract", "type": "address" }
                    ],
                    "SlippageAndActions": [
                        { "name": "recipient", "type": "address" },
                        { "name": "buyToken", "type": "address" },
                        { "name": "minAmountOut", "type": "uint256" }
                    ],
                    "MetaTransaction": [
                        { "name": "slippageAndActions", "type": "SlippageAndActions" },
                        { "name": "msgSender", "type": "address" }
                    ]
                },
                "domain": {
                    "name": "ZeroEx",
                    "chainId": 8453,
                    "verifyingContract": "0x0000000000001ff3684f28c67538d4d072c22734"
                },
                "message": {
                    "slippageAndActions": {
                        "recipient": TAKER,
                        "buyToken": "0x4200000000000000000000000000000000000006",
                        "minAmountOut": "1216071628260"
                    },
                    "msgSender": TAKER
                },
                "primaryType": "MetaTransaction"
            }
        },
        "zid": "0xquote"
    }))
    .unwrap()
}

fn quote_with_approval() -> GaslessQuoteResponse {
    let mut quote = trade_only_quote();
    quote.approval = Some(
        serde_json::from_value(json!({
            "type": "permit",
            "hash": "0x61f1c9e04bdcb65f94b4e5a24d3d947c64a4553e5a80dcba279b01b792a35ca8",
            "eip712": {
                "types": {
                    "EIP712Domain": [
                        { "name": "name", "type": "string" },
                        { "name": "chainId", "type": "uint256" },
                        { "name": "verifyingContract", "type": "address" }
                    ],
                    "Permit": [
                        { "name": "owner", "type": "address" },
                        { "name": "spender", "type": "address" },
                        { "name": "value", "type": "uint256" },
                        { "name": "nonce", "type": "uint256" },
                        { "name": "deadline", "type": "uint256" }
                    ]
                },
                "domain": {
                    "name": "USD Coin",
                    "chainId": 8453,
                    "verifyingContract": "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"
                },
                "message": {
                    "owner": TAKER,
                    "spender": "0x0000000000001ff3684f28c67538d4d072c22734",
                    "value": "1000000",
                    "nonce": "0",
                    "deadline": "1800000000"
                },
                "primaryType": "Permit"
            }
        }))
        .unwrap(),
    );
    quote
}

fn no_liquidity_quote() -> GaslessQuoteResponse {
    serde_json::from_value(json!({ "liquidityAvailable": false })).unwrap()
}

fn quote_request() -> GaslessQuoteRequest {
    GaslessQuoteRequest {
        chain_id: CHAIN_ID,
        sell_token: "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913".to_string(),
        buy_token: "0x4200000000000000000000000000000000000006".to_string(),
        sell_amount: "1000000".to_string(),
        taker: TAKER.to_string(),
        slippage_bps: Some(100),
    }
}

fn fast_config() -> FlowConfig {
    let mut config = FlowConfig::new(CHAIN_ID);
    config.poll = PollOptions {
        interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
    };
    config
}

#[tokio::test]
async fn test_full_flow_without_approval() {
    let api = MockApi::new(
        trade_only_quote(),
        vec![
            StatusScript::Observed(TradeStatus::Pending),
            StatusScript::Observed(TradeStatus::Succeeded),
            StatusScript::Observed(TradeStatus::Confirmed),
        ],
    );
    let signer = MockSigner::new();
    let mut flow = GaslessFlow::new(&api, &signer, fast_config());

    // Indicative price first, as a real taker would.
    let price = flow
        .fetch_price(&GaslessPriceRequest::from(quote_request()))
        .await
        .unwrap();
    assert!(price.liquidity_available);
    assert!(matches!(flow.state(), FlowState::PriceFetched(_)));

    let outcome = flow
        .execute(&quote_request(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, FlowOutcome::Confirmed);
    assert!(matches!(
        flow.state(),
        FlowState::Terminal(FlowOutcome::Confirmed)
    ));
    assert_eq!(signer.signed_primary_types(), vec!["MetaTransaction"]);
    assert_eq!(api.status_calls(), 3);

    let payloads = api.submitted_payloads();
    assert_eq!(payloads.len(), 1);
    assert!(payloads[0].approval.is_none());
    assert_eq!(payloads[0].chain_id, CHAIN_ID);
}

#[tokio::test]
async fn test_approval_signed_before_trade() {
    let api = MockApi::new(
        quote_with_approval(),
        vec![StatusScript::Observed(TradeStatus::Confirmed)],
    );
    let signer = MockSigner::new();
    let mut flow = GaslessFlow::new(&api, &signer, fast_config());

    let outcome = flow
        .execute(&quote_request(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, FlowOutcome::Confirmed);
    assert_eq!(
        signer.signed_primary_types(),
        vec!["Permit", "MetaTransaction"]
    );

    let payloads = api.submitted_payloads();
    let approval = payloads[0].approval.as_ref().unwrap();
    // The payload embeds the quote's original EIP-712 object, not the
    // canonicalized signing view.
    assert_eq!(
        approval.eip712,
        quote_with_approval().approval.unwrap().eip712
    );
    assert_eq!(approval.signature.v, 27);
}

#[tokio::test]
async fn test_pending_trade_conflict_is_terminal() {
    let api = MockApi::new(trade_only_quote(), Vec::new()).with_submit_error(
        Error::PendingTradeConflict {
            message: "pending trade already exists".to_string(),
            zid: Some("0xconflict".to_string()),
        },
    );
    let signer = MockSigner::new();
    let mut flow = GaslessFlow::new(&api, &signer, fast_config());

    flow.fetch_quote(&quote_request()).await.unwrap();
    flow.sign().await.unwrap();
    let error = flow.submit().await.unwrap_err();

    assert!(matches!(
        error.current_context(),
        Error::PendingTradeConflict { .. }
    ));
    assert!(matches!(
        flow.state(),
        FlowState::Terminal(FlowOutcome::Failed)
    ));
    assert_eq!(api.status_calls(), 0);
}

#[tokio::test]
async fn test_expired_quote_never_reaches_signer() {
    let api = MockApi::new(trade_only_quote(), Vec::new());
    let signer = MockSigner::new();
    let mut config = fast_config();
    config.quote_validity = Duration::ZERO;
    let mut flow = GaslessFlow::new(&api, &signer, config);

    flow.fetch_quote(&quote_request()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let error = flow.sign().await.unwrap_err();

    assert!(matches!(error.current_context(), Error::QuoteExpired));
    assert!(signer.signed_primary_types().is_empty());
    // Still re-signable after a fresh quote.
    assert!(matches!(flow.state(), FlowState::QuoteFetched { .. }));
}

#[tokio::test]
async fn test_no_liquidity_price_stops_the_flow() {
    let api = MockApi::new(no_liquidity_quote(), Vec::new());
    let signer = MockSigner::new();
    let mut flow = GaslessFlow::new(&api, &signer, fast_config());

    let error = flow
        .fetch_price(&GaslessPriceRequest::from(quote_request()))
        .await
        .unwrap_err();

    assert!(matches!(error.current_context(), Error::NoLiquidity));
    assert!(matches!(flow.state(), FlowState::Idle));
}

#[tokio::test]
async fn test_chain_mismatch_rejected() {
    let api = MockApi::new(trade_only_quote(), Vec::new());
    let signer = MockSigner::new();
    let mut flow = GaslessFlow::new(&api, &signer, fast_config());

    let mut request = quote_request();
    request.chain_id = 1;
    let error = flow.fetch_quote(&request).await.unwrap_err();

    assert!(matches!(error.current_context(), Error::InvalidInput(_)));
    assert!(matches!(flow.state(), FlowState::Idle));
}

#[tokio::test]
async fn test_poller_stops_at_confirmed() {
    let api = MockApi::new(
        trade_only_quote(),
        vec![
            StatusScript::Observed(TradeStatus::Pending),
            StatusScript::Observed(TradeStatus::Submitted),
            StatusScript::Observed(TradeStatus::Succeeded),
            StatusScript::Observed(TradeStatus::Confirmed),
        ],
    );
    let options = PollOptions {
        interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
    };
    let mut seen = Vec::new();
    let mut record = |status: TradeStatus| seen.push(status);

    let status = poll_trade_status(
        &api,
        TRADE_HASH,
        CHAIN_ID,
        &options,
        &CancellationToken::new(),
        Some(&mut record),
    )
    .await
    .unwrap();

    assert_eq!(status, TradeStatus::Confirmed);
    assert_eq!(api.status_calls(), 4);
    assert_eq!(
        seen,
        vec![
            TradeStatus::Pending,
            TradeStatus::Submitted,
            TradeStatus::Succeeded,
            TradeStatus::Confirmed,
        ]
    );
}

#[tokio::test]
async fn test_poller_stops_at_failed() {
    let api = MockApi::new(
        trade_only_quote(),
        vec![
            StatusScript::Observed(TradeStatus::Pending),
            StatusScript::Observed(TradeStatus::Failed),
        ],
    );
    let options = PollOptions {
        interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
    };

    let status = poll_trade_status(
        &api,
        TRADE_HASH,
        CHAIN_ID,
        &options,
        &CancellationToken::new(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(status, TradeStatus::Failed);
    assert_eq!(api.status_calls(), 2);
}

#[tokio::test]
async fn test_poller_treats_not_indexed_as_pending() {
    let api = MockApi::new(
        trade_only_quote(),
        vec![
            StatusScript::NotIndexed,
            StatusScript::Observed(TradeStatus::Confirmed),
        ],
    );
    let options = PollOptions {
        interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
    };
    let mut seen = Vec::new();
    let mut record = |status: TradeStatus| seen.push(status);

    let status = poll_trade_status(
        &api,
        TRADE_HASH,
        CHAIN_ID,
        &options,
        &CancellationToken::new(),
        Some(&mut record),
    )
    .await
    .unwrap();

    assert_eq!(status, TradeStatus::Confirmed);
    assert_eq!(seen, vec![TradeStatus::Pending, TradeStatus::Confirmed]);
}

#[tokio::test]
async fn test_poller_ignores_out_of_order_statuses() {
    // A stale replica answering `pending` after `succeeded` was observed.
    let api = MockApi::new(
        trade_only_quote(),
        vec![
            StatusScript::Observed(TradeStatus::Succeeded),
            StatusScript::Observed(TradeStatus::Pending),
            StatusScript::Observed(TradeStatus::Confirmed),
        ],
    );
    let options = PollOptions {
        interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
    };
    let mut seen = Vec::new();
    let mut record = |status: TradeStatus| seen.push(status);

    let status = poll_trade_status(
        &api,
        TRADE_HASH,
        CHAIN_ID,
        &options,
        &CancellationToken::new(),
        Some(&mut record),
    )
    .await
    .unwrap();

    assert_eq!(status, TradeStatus::Confirmed);
    assert_eq!(api.status_calls(), 3);
    assert_eq!(seen, vec![TradeStatus::Succeeded, TradeStatus::Confirmed]);
}

#[tokio::test]
async fn test_poller_survives_transient_failures() {
    let api = MockApi::new(
        trade_only_quote(),
        vec![
            StatusScript::Transport,
            StatusScript::Observed(TradeStatus::Confirmed),
        ],
    );
    let options = PollOptions {
        interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
    };

    let status = poll_trade_status(
        &api,
        TRADE_HASH,
        CHAIN_ID,
        &options,
        &CancellationToken::new(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(status, TradeStatus::Confirmed);
    assert_eq!(api.status_calls(), 2);
}

#[tokio::test]
async fn test_poll_timeout_returns_flow_to_submitted() {
    // The empty script answers pending forever.
    let api = MockApi::new(trade_only_quote(), Vec::new());
    let signer = MockSigner::new();
    let mut config = fast_config();
    config.poll = PollOptions {
        interval: Duration::from_millis(1),
        timeout: Duration::from_millis(20),
    };
    let mut flow = GaslessFlow::new(&api, &signer, config);

    flow.fetch_quote(&quote_request()).await.unwrap();
    flow.sign().await.unwrap();
    flow.submit().await.unwrap();
    let error = flow.poll(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(error.current_context(), Error::PollTimeout));
    assert!(matches!(flow.state(), FlowState::Submitted { .. }));
    assert_eq!(flow.trade_hash(), Some(TRADE_HASH));
}

#[tokio::test]
async fn test_cancellation_stops_polling() {
    let api = MockApi::new(trade_only_quote(), Vec::new());
    let signer = MockSigner::new();
    let mut flow = GaslessFlow::new(&api, &signer, fast_config());

    flow.fetch_quote(&quote_request()).await.unwrap();
    flow.sign().await.unwrap();
    flow.submit().await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let error = flow.poll(&cancel).await.unwrap_err();

    assert!(matches!(error.current_context(), Error::Cancelled));
    assert!(matches!(flow.state(), FlowState::Submitted { .. }));
}

#[tokio::test]
async fn test_submit_requires_signed_state() {
    let api = MockApi::new(trade_only_quote(), Vec::new());
    let signer = MockSigner::new();
    let mut flow = GaslessFlow::new(&api, &signer, fast_config());

    let error = flow.submit().await.unwrap_err();
    assert!(matches!(error.current_context(), Error::InvalidInput(_)));
    assert!(api.submitted_payloads().is_empty());
}
