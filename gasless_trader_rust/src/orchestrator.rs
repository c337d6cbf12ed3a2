use error_stack::{ResultExt as _, report};
use gasless_models::models::signature::{SignatureType, split_signature};
use gasless_models::models::submit::{SubmitPayload, build_submit_payload};
use gasless_models::models::trade::TradeStatus;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::GaslessApi;
use crate::api::requests::{GaslessPriceRequest, GaslessQuoteRequest};
use crate::api::responses::{GaslessPriceResponse, GaslessQuoteResponse};
use crate::error::{Error, TraderResult};
use crate::poller::{PollOptions, poll_trade_status};
use crate::retry::{RetryPolicy, with_retry};
use crate::signer::TradeSigner;

/// The API documents roughly 30 seconds of quote validity. The default gate
/// is tighter so a signature is never produced for a quote that will be
/// stale by the time it reaches the relayer.
pub const DEFAULT_QUOTE_VALIDITY: Duration = Duration::from_secs(25);

#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub chain_id: u64,
    pub signature_type: SignatureType,
    pub quote_validity: Duration,
    pub poll: PollOptions,
    pub retry: RetryPolicy,
}

impl FlowConfig {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            signature_type: SignatureType::Eip712,
            quote_validity: DEFAULT_QUOTE_VALIDITY,
            poll: PollOptions::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Where a finished flow ended up. `succeeded` is reported through the poll
/// callback as an inclusion milestone rather than as a distinct terminal
/// state; finality is `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    Confirmed,
    Failed,
}

#[derive(Debug, Clone)]
pub enum FlowState {
    Idle,
    PriceFetched(GaslessPriceResponse),
    QuoteFetched {
        quote: GaslessQuoteResponse,
        fetched_at: Instant,
    },
    Signed {
        quote: GaslessQuoteResponse,
        payload: SubmitPayload,
    },
    Submitted {
        trade_hash: String,
    },
    Polling {
        trade_hash: String,
    },
    Terminal(FlowOutcome),
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::PriceFetched(_) => "price_fetched",
            FlowState::QuoteFetched { .. } => "quote_fetched",
            FlowState::Signed { .. } => "signed",
            FlowState::Submitted { .. } => "submitted",
            FlowState::Polling { .. } => "polling",
            FlowState::Terminal(_) => "terminal",
        }
    }
}

/// One gasless trade, price to settlement. Each flow owns its own state;
/// run as many concurrent flows as needed over a shared `Arc` client.
pub struct GaslessFlow<A, S> {
    api: A,
    signer: S,
    config: FlowConfig,
    state: FlowState,
}

impl<A: GaslessApi, S: TradeSigner> GaslessFlow<A, S> {
    pub fn new(api: A, signer: S, config: FlowConfig) -> Self {
        Self {
            api,
            signer,
            config,
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn trade_hash(&self) -> Option<&str> {
        match &self.state {
            FlowState::Submitted { trade_hash } | FlowState::Polling { trade_hash } => {
                Some(trade_hash)
            }
            _ => None,
        }
    }

    /// Indicative price. Informational only: nothing is signed and no state
    /// beyond `PriceFetched` is reachable from here without a quote.
    pub async fn fetch_price(
        &mut self,
        request: &GaslessPriceRequest,
    ) -> TraderResult<GaslessPriceResponse> {
        self.check_chain(request.chain_id)?;

        let api = &self.api;
        let response = with_retry(&self.config.retry, || api.price(request)).await?;

        if !response.liquidity_available {
            return Err(report!(Error::NoLiquidity));
        }

        self.state = FlowState::PriceFetched(response.clone());
        Ok(response)
    }

    /// Firm quote. Starts the validity window that [`GaslessFlow::sign`]
    /// enforces.
    pub async fn fetch_quote(
        &mut self,
        request: &GaslessQuoteRequest,
    ) -> TraderResult<GaslessQuoteResponse> {
        self.check_chain(request.chain_id)?;

        let api = &self.api;
        let response = with_retry(&self.config.retry, || api.quote(request)).await?;

        if !response.liquidity_available || response.trade.is_none() {
            return Err(report!(Error::NoLiquidity));
        }

        debug!(zid = ?response.zid, "quote fetched");
        self.state = FlowState::QuoteFetched {
            quote: response.clone(),
            fetched_at: Instant::now(),
        };
        Ok(response)
    }

    /// Signs the approval (when present) and then the trade, and packages
    /// the submit payload.
    ///
    /// The canonicalized view of each EIP-712 object is what gets signed;
    /// the payload embeds the quote's originals. An expired quote fails with
    /// [`Error::QuoteExpired`] before the signer is ever invoked, and the
    /// flow stays in `QuoteFetched` so the caller can re-fetch.
    pub async fn sign(&mut self) -> TraderResult<()> {
        let (quote, fetched_at) = match &self.state {
            FlowState::QuoteFetched { quote, fetched_at } => (quote.clone(), *fetched_at),
            other => {
                return Err(report!(Error::InvalidInput(format!(
                    "cannot sign from state '{}'",
                    other.name()
                ))));
            }
        };

        if fetched_at.elapsed() > self.config.quote_validity {
            return Err(report!(Error::QuoteExpired).attach_printable(format!(
                "quote was fetched {:?} ago, validity window is {:?}",
                fetched_at.elapsed(),
                self.config.quote_validity
            )));
        }

        let trade = quote
            .trade
            .clone()
            .ok_or_else(|| report!(Error::NoLiquidity))?;

        // Approval first, then trade. There is no data dependency between
        // the two signatures, but the documented request order is fixed.
        let approval_signature = match &quote.approval {
            Some(approval) => {
                let canonical = approval
                    .eip712
                    .canonicalize()
                    .change_context(Error::ModelsError)?;
                let raw = self.signer.sign_typed_data(&canonical).await?;
                Some(
                    split_signature(&raw, self.config.signature_type)
                        .change_context(Error::ModelsError)?,
                )
            }
            None => None,
        };

        let canonical = trade
            .eip712
            .canonicalize()
            .change_context(Error::ModelsError)?;
        let raw = self.signer.sign_typed_data(&canonical).await?;
        let trade_signature = split_signature(&raw, self.config.signature_type)
            .change_context(Error::ModelsError)?;

        let payload = build_submit_payload(
            self.config.chain_id,
            &trade,
            trade_signature,
            quote.approval.as_ref(),
            approval_signature,
        )
        .change_context(Error::ModelsError)?;

        self.state = FlowState::Signed { quote, payload };
        Ok(())
    }

    /// Sends the signed payload. Deliberately never retried: an ambiguous
    /// failure here may already have reached the relayer, and without a
    /// trade hash there is nothing safe to poll before retrying.
    pub async fn submit(&mut self) -> TraderResult<String> {
        let payload = match &self.state {
            FlowState::Signed { payload, .. } => payload.clone(),
            other => {
                return Err(report!(Error::InvalidInput(format!(
                    "cannot submit from state '{}'",
                    other.name()
                ))));
            }
        };

        match self.api.submit(&payload).await {
            Ok(response) => {
                info!(trade_hash = %response.trade_hash, zid = ?response.zid, "trade submitted");
                self.state = FlowState::Submitted {
                    trade_hash: response.trade_hash.clone(),
                };
                Ok(response.trade_hash)
            }
            Err(error) => {
                if matches!(
                    error.current_context(),
                    Error::PendingTradeConflict { .. } | Error::Remote { .. }
                ) {
                    // Validation and conflict failures are final for this
                    // payload; a re-submission would reproduce them.
                    self.state = FlowState::Terminal(FlowOutcome::Failed);
                }
                Err(error)
            }
        }
    }

    pub async fn poll(&mut self, cancel: &CancellationToken) -> TraderResult<FlowOutcome> {
        self.poll_with(cancel, None).await
    }

    /// Polls until finality. `on_update` receives every observed status,
    /// including the `succeeded` inclusion milestone. On `PollTimeout` or
    /// cancellation the flow returns to `Submitted`; status reads are
    /// idempotent, so polling the same hash can resume later.
    pub async fn poll_with(
        &mut self,
        cancel: &CancellationToken,
        on_update: Option<&mut (dyn FnMut(TradeStatus) + Send)>,
    ) -> TraderResult<FlowOutcome> {
        let trade_hash = match &self.state {
            FlowState::Submitted { trade_hash } | FlowState::Polling { trade_hash } => {
                trade_hash.clone()
            }
            other => {
                return Err(report!(Error::InvalidInput(format!(
                    "cannot poll from state '{}'",
                    other.name()
                ))));
            }
        };

        self.state = FlowState::Polling {
            trade_hash: trade_hash.clone(),
        };

        let result = poll_trade_status(
            &self.api,
            &trade_hash,
            self.config.chain_id,
            &self.config.poll,
            cancel,
            on_update,
        )
        .await;

        match result {
            Ok(TradeStatus::Confirmed) => {
                info!(%trade_hash, "trade confirmed");
                self.state = FlowState::Terminal(FlowOutcome::Confirmed);
                Ok(FlowOutcome::Confirmed)
            }
            Ok(TradeStatus::Failed) => {
                info!(%trade_hash, "trade failed");
                self.state = FlowState::Terminal(FlowOutcome::Failed);
                Ok(FlowOutcome::Failed)
            }
            Ok(status) => Err(report!(Error::Unknown)
                .attach_printable(format!("poller stopped at non-terminal status '{status}'"))),
            Err(error) => {
                match error.current_context() {
                    Error::PollTimeout | Error::Cancelled => {
                        self.state = FlowState::Submitted { trade_hash };
                    }
                    _ => {
                        self.state = FlowState::Terminal(FlowOutcome::Failed);
                    }
                }
                Err(error)
            }
        }
    }

    /// Quote, sign, submit, and poll in one call.
    pub async fn execute(
        &mut self,
        request: &GaslessQuoteRequest,
        cancel: &CancellationToken,
    ) -> TraderResult<FlowOutcome> {
        self.fetch_quote(request).await?;
        self.sign().await?;
        self.submit().await?;
        self.poll(cancel).await
    }

    fn check_chain(&self, chain_id: u64) -> TraderResult<()> {
        if chain_id != self.config.chain_id {
            return Err(report!(Error::InvalidInput(format!(
                "request targets chain {chain_id} but this flow is configured for chain {}",
                self.config.chain_id
            ))));
        }
        Ok(())
    }
}
