pub mod gasless;
pub mod requests;
pub mod responses;

use async_trait::async_trait;
use gasless_models::models::submit::SubmitPayload;
use gasless_models::network::client_rate_limit::Client;
use std::sync::Arc;

use crate::api::gasless::{
    gasless_get_price, gasless_get_quote, gasless_get_status, gasless_submit,
};
use crate::api::requests::{GaslessPriceRequest, GaslessQuoteRequest};
use crate::api::responses::{
    GaslessPriceResponse, GaslessQuoteResponse, GaslessStatusResponse, GaslessSubmitResponse,
};
use crate::error::TraderResult;

// https://0x.org/docs/gasless-api
pub const BASE_GASLESS_API_URL: &str = "https://api.0x.org/gasless";

pub const API_KEY_HEADER: &str = "0x-api-key";
pub const API_VERSION_HEADER: &str = "0x-version";
pub const API_VERSION: &str = "v2";

/// The four documented Gasless endpoints. The orchestrator and poller only
/// depend on this trait, so tests can script responses without a network.
#[async_trait]
pub trait GaslessApi: Send + Sync {
    async fn price(&self, request: &GaslessPriceRequest) -> TraderResult<GaslessPriceResponse>;

    async fn quote(&self, request: &GaslessQuoteRequest) -> TraderResult<GaslessQuoteResponse>;

    async fn submit(&self, payload: &SubmitPayload) -> TraderResult<GaslessSubmitResponse>;

    async fn status(&self, trade_hash: &str, chain_id: u64)
    -> TraderResult<GaslessStatusResponse>;
}

// A shared client can back many concurrent flows.
#[async_trait]
impl<T: GaslessApi + ?Sized> GaslessApi for &T {
    async fn price(&self, request: &GaslessPriceRequest) -> TraderResult<GaslessPriceResponse> {
        (**self).price(request).await
    }

    async fn quote(&self, request: &GaslessQuoteRequest) -> TraderResult<GaslessQuoteResponse> {
        (**self).quote(request).await
    }

    async fn submit(&self, payload: &SubmitPayload) -> TraderResult<GaslessSubmitResponse> {
        (**self).submit(payload).await
    }

    async fn status(
        &self,
        trade_hash: &str,
        chain_id: u64,
    ) -> TraderResult<GaslessStatusResponse> {
        (**self).status(trade_hash, chain_id).await
    }
}

#[async_trait]
impl<T: GaslessApi + ?Sized> GaslessApi for Arc<T> {
    async fn price(&self, request: &GaslessPriceRequest) -> TraderResult<GaslessPriceResponse> {
        (**self).price(request).await
    }

    async fn quote(&self, request: &GaslessQuoteRequest) -> TraderResult<GaslessQuoteResponse> {
        (**self).quote(request).await
    }

    async fn submit(&self, payload: &SubmitPayload) -> TraderResult<GaslessSubmitResponse> {
        (**self).submit(payload).await
    }

    async fn status(
        &self,
        trade_hash: &str,
        chain_id: u64,
    ) -> TraderResult<GaslessStatusResponse> {
        (**self).status(trade_hash, chain_id).await
    }
}

/// HTTP client for the hosted Gasless API.
#[derive(Debug, Clone)]
pub struct ZeroExGaslessClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ZeroExGaslessClient {
    pub fn new(client: Client, api_key: String) -> Self {
        Self::with_base_url(client, api_key, BASE_GASLESS_API_URL.to_string())
    }

    pub fn with_base_url(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl GaslessApi for ZeroExGaslessClient {
    async fn price(&self, request: &GaslessPriceRequest) -> TraderResult<GaslessPriceResponse> {
        gasless_get_price(&self.client, &self.api_key, &self.base_url, request).await
    }

    async fn quote(&self, request: &GaslessQuoteRequest) -> TraderResult<GaslessQuoteResponse> {
        gasless_get_quote(&self.client, &self.api_key, &self.base_url, request).await
    }

    async fn submit(&self, payload: &SubmitPayload) -> TraderResult<GaslessSubmitResponse> {
        gasless_submit(&self.client, &self.api_key, &self.base_url, payload).await
    }

    async fn status(
        &self,
        trade_hash: &str,
        chain_id: u64,
    ) -> TraderResult<GaslessStatusResponse> {
        gasless_get_status(&self.client, &self.api_key, &self.base_url, trade_hash, chain_id)
            .await
    }
}
