use error_stack::{Report, ResultExt as _, report};
use gasless_models::constants::chains::{NATIVE_TOKEN_EVM_ADDRESS, is_native_token_evm_address};
use gasless_models::error::Error as ModelsError;
use gasless_models::models::submit::SubmitPayload;
use gasless_models::network::client_rate_limit::Client;
use gasless_models::network::http::{handle_api_response, value_to_sorted_querystring};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::api::requests::{GaslessPriceRequest, GaslessQuoteRequest};
use crate::api::responses::{
    GaslessPriceResponse, GaslessQuoteResponse, GaslessStatusResponse, GaslessSubmitResponse,
};
use crate::api::{API_KEY_HEADER, API_VERSION, API_VERSION_HEADER};
use crate::error::{Error, TraderResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Price,
    Quote,
    Submit,
    Status,
}

/// The API quotes native-token buys against the `0xeee...` sentinel.
fn normalize_buy_token(token_address: String) -> String {
    if is_native_token_evm_address(&token_address) {
        NATIVE_TOKEN_EVM_ADDRESS.to_string()
    } else {
        token_address
    }
}

/// Gasless trades move the sell token by signature, which only ERC-20s
/// support. Rejected locally so no request (and no API-plan quota) is spent.
fn check_sell_token(sell_token: &str) -> TraderResult<()> {
    if is_native_token_evm_address(sell_token) {
        return Err(report!(Error::InvalidInput(
            "the native token cannot be sold gaslessly; wrap it first".to_string()
        )));
    }
    Ok(())
}

/// Translates the shared HTTP-layer error into this crate's taxonomy.
/// Branching happens on HTTP status and the parsed `name` code, never on
/// message text.
fn map_api_error(report: Report<ModelsError>, endpoint: Endpoint) -> Report<Error> {
    let mapped = match report.current_context() {
        ModelsError::Api {
            status,
            code,
            message,
            zid,
        } => match *status {
            401 | 403 => Error::Unauthorized {
                message: message.clone(),
                zid: zid.clone(),
            },
            404 if endpoint == Endpoint::Status => Error::NotIndexed,
            429 if endpoint == Endpoint::Submit => Error::PendingTradeConflict {
                message: message.clone(),
                zid: zid.clone(),
            },
            429 => Error::RateLimited,
            status if status >= 500 => Error::ServerError(status),
            _ => Error::Remote {
                code: code.clone(),
                message: message.clone(),
                zid: zid.clone(),
            },
        },
        ModelsError::ReqwestError(_) => Error::ReqwestError,
        _ => Error::ModelsError,
    };
    report.change_context(mapped)
}

async fn execute_get<T: DeserializeOwned>(
    client: &Client,
    api_key: &str,
    url: &str,
    endpoint: Endpoint,
) -> TraderResult<T> {
    debug!(url, "gasless API request");

    let request = client
        .inner_client()
        .get(url)
        .header(API_KEY_HEADER, api_key)
        .header(API_VERSION_HEADER, API_VERSION)
        .build()
        .change_context(Error::ReqwestError)
        .attach_printable("Error building gasless request")?;

    let response = client
        .execute(request)
        .await
        .change_context(Error::ReqwestError)
        .attach_printable("Error in gasless request")?;

    handle_api_response(response)
        .await
        .map_err(|error| map_api_error(error, endpoint))
}

pub async fn gasless_get_price(
    client: &Client,
    api_key: &str,
    base_url: &str,
    request: &GaslessPriceRequest,
) -> TraderResult<GaslessPriceResponse> {
    check_sell_token(&request.sell_token)?;

    let query = json!({
        "chainId": request.chain_id,
        "sellToken": request.sell_token,
        "buyToken": normalize_buy_token(request.buy_token.clone()),
        "sellAmount": request.sell_amount,
        "taker": request.taker,
        "slippageBps": request.slippage_bps,
    });

    let query_string = value_to_sorted_querystring(&query).change_context(Error::ParseError)?;
    let url = format!("{base_url}/price?{query_string}");

    execute_get(client, api_key, &url, Endpoint::Price).await
}

pub async fn gasless_get_quote(
    client: &Client,
    api_key: &str,
    base_url: &str,
    request: &GaslessQuoteRequest,
) -> TraderResult<GaslessQuoteResponse> {
    check_sell_token(&request.sell_token)?;

    let query = json!({
        "chainId": request.chain_id,
        "sellToken": request.sell_token,
        "buyToken": normalize_buy_token(request.buy_token.clone()),
        "sellAmount": request.sell_amount,
        "taker": request.taker,
        "slippageBps": request.slippage_bps,
    });

    let query_string = value_to_sorted_querystring(&query).change_context(Error::ParseError)?;
    let url = format!("{base_url}/quote?{query_string}");

    execute_get(client, api_key, &url, Endpoint::Quote).await
}

/// Submits the signed payload. Callers must not blindly retry this on
/// ambiguous failure: no trade hash is returned on error, so a retry risks
/// double-submission.
pub async fn gasless_submit(
    client: &Client,
    api_key: &str,
    base_url: &str,
    payload: &SubmitPayload,
) -> TraderResult<GaslessSubmitResponse> {
    let url = format!("{base_url}/submit");
    debug!(url, "gasless submit request");

    let request = client
        .inner_client()
        .post(&url)
        .header(API_KEY_HEADER, api_key)
        .header(API_VERSION_HEADER, API_VERSION)
        .json(payload)
        .build()
        .change_context(Error::ReqwestError)
        .attach_printable("Error building gasless submit request")?;

    let response = client
        .execute(request)
        .await
        .change_context(Error::ReqwestError)
        .attach_printable("Error in gasless submit request")?;

    handle_api_response(response)
        .await
        .map_err(|error| map_api_error(error, Endpoint::Submit))
}

pub async fn gasless_get_status(
    client: &Client,
    api_key: &str,
    base_url: &str,
    trade_hash: &str,
    chain_id: u64,
) -> TraderResult<GaslessStatusResponse> {
    let url = format!("{base_url}/status/{trade_hash}?chainId={chain_id}");
    execute_get(client, api_key, &url, Endpoint::Status).await
}
