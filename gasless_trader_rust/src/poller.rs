use error_stack::report;
use gasless_models::models::trade::TradeStatus;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::GaslessApi;
use crate::error::{Error, TraderResult};

/// Gasless trades usually settle within seconds to low minutes. The docs
/// give no status SLA, so these defaults are deliberate choices: poll often
/// enough to catch fast settlement, give up well after the relayer would
/// have either landed or dropped the trade.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// Polls the status endpoint until the trade reaches `confirmed` or
/// `failed`, the deadline lapses, or the caller cancels.
///
/// - A 404 (`NotIndexed`) counts as `pending`: indexing lag is expected
///   right after submission.
/// - Transient transport failures do not abort the loop; the next tick
///   retries, so the poll interval itself bounds the retry cadence.
/// - `on_update` fires on every observed status change, which is where
///   `succeeded` is surfaced: it marks inclusion, not finality, so the loop
///   keeps going until `confirmed`.
/// - Cancellation is checked before each request and while sleeping.
///   In-flight requests are not force-aborted.
pub async fn poll_trade_status<A>(
    api: &A,
    trade_hash: &str,
    chain_id: u64,
    options: &PollOptions,
    cancel: &CancellationToken,
    mut on_update: Option<&mut (dyn FnMut(TradeStatus) + Send)>,
) -> TraderResult<TradeStatus>
where
    A: GaslessApi + ?Sized,
{
    let deadline = Instant::now() + options.timeout;
    let mut last_seen: Option<TradeStatus> = None;

    loop {
        if cancel.is_cancelled() {
            return Err(report!(Error::Cancelled)
                .attach_printable(format!("stopped watching trade {trade_hash}")));
        }
        if Instant::now() >= deadline {
            return Err(report!(Error::PollTimeout).attach_printable(format!(
                "trade {trade_hash} not terminal within {:?}",
                options.timeout
            )));
        }

        let observed = match api.status(trade_hash, chain_id).await {
            Ok(response) => Some(response.status),
            Err(error) => match error.current_context() {
                Error::NotIndexed => Some(TradeStatus::Pending),
                context if context.is_transient() => {
                    warn!(trade_hash, "transient status failure: {context}");
                    None
                }
                _ => return Err(error),
            },
        };

        if let Some(status) = observed {
            // Statuses only move forward through the lattice; a backwards
            // read is a stale replica answering and gets the same treatment
            // as a transient failure.
            if !last_seen.is_none_or(|prev| prev.can_advance_to(status)) {
                warn!(trade_hash, %status, ?last_seen, "ignoring out-of-order status");
            } else {
                if last_seen != Some(status) {
                    debug!(trade_hash, %status, "trade status update");
                    if let Some(callback) = on_update.as_deref_mut() {
                        callback(status);
                    }
                    last_seen = Some(status);
                }

                if status.is_terminal() {
                    return Ok(status);
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(report!(Error::Cancelled)
                    .attach_printable(format!("stopped watching trade {trade_hash}")));
            }
            _ = sleep(options.interval) => {}
        }
    }
}
