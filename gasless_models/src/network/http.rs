use error_stack::{ResultExt, report};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::value::Value;
use tracing::error;

use crate::error::{Error, ModelResult};
use crate::models::api_error::{ApiErrorCode, ErrorResponse};

/// Converts a JSON object into a URL-encoded query string with parameters
/// sorted alphabetically by key. Null values are dropped rather than
/// serialized as the literal string "null".
pub fn value_to_sorted_querystring(value: &Value) -> ModelResult<String> {
    let mut pairs: Vec<(String, String)> = match value {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !matches!(v, Value::Null))
            .map(|(k, v)| {
                let value_str = match v {
                    Value::String(s) => s.to_string(),
                    _ => v.to_string(),
                };
                (k.clone(), value_str)
            })
            .collect(),
        _ => {
            return Err(report!(Error::ParseError)
                .attach_printable(format!("Invalid JSON Object: {value:?}")));
        }
    };

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<String>>()
        .join("&"))
}

/// Decodes a successful response as JSON, or parses the documented error
/// payload (`{ name, message, data: { zid } }`) out of a failed one.
///
/// Responses that fail without a parseable payload still produce
/// [`Error::Api`] so callers can branch on the HTTP status uniformly.
pub async fn handle_api_response<T: DeserializeOwned>(response: Response) -> ModelResult<T> {
    let status = response.status().as_u16();

    if response.status().is_success() {
        return response.json().await.change_context(Error::SerdeDeserialize(
            "Failed to deserialize response JSON".to_string(),
        ));
    }

    let body = response
        .text()
        .await
        .change_context(Error::ReqwestError(
            "Failed to read error response body".to_string(),
        ))?;

    error!(status, body = %body, "API request failed");

    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) => Err(report!(Error::Api {
            status,
            code: parsed.code(),
            zid: parsed.zid().map(str::to_string),
            message: parsed.message,
        })),
        Err(_) => Err(report!(Error::Api {
            status,
            code: ApiErrorCode::Other(format!("HTTP_{status}")),
            message: body,
            zid: None,
        })),
    }
}
