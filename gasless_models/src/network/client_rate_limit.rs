use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client as ReqwestClient, Error as ReqwestError, Request, Response};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::network::RateLimitWindow;

/// HTTP client handle shared across trade flows. Keyed API plans come with a
/// request budget, so callers can opt into client-side throttling instead of
/// burning the budget on 429 responses.
#[derive(Debug, Clone)]
pub enum Client {
    RateLimited(RateLimitedClient),
    Unrestricted(ReqwestClient),
}

impl Client {
    pub async fn execute(&self, req: Request) -> Result<Response, ReqwestError> {
        match self {
            Client::RateLimited(client) => client.execute(req).await,
            Client::Unrestricted(client) => client.execute(req).await,
        }
    }

    pub fn inner_client(&self) -> &ReqwestClient {
        match self {
            Client::RateLimited(client) => client.inner_client(),
            Client::Unrestricted(client) => client,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitedClient {
    inner: ReqwestClient,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl RateLimitedClient {
    pub fn new(limit: RateLimitWindow, burst: Option<NonZeroU32>) -> Self {
        let mut quota = match limit {
            RateLimitWindow::PerSecond(allowed) => Quota::per_second(allowed),
            RateLimitWindow::PerMinute(allowed) => Quota::per_minute(allowed),
            RateLimitWindow::Custom { period } => {
                Quota::with_period(period).unwrap_or(Quota::per_second(NonZeroU32::MIN))
            }
        };
        if let Some(burst) = burst {
            quota = quota.allow_burst(burst);
        }

        Self {
            inner: ReqwestClient::new(),
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Reference to the underlying reqwest client, for request building.
    pub fn inner_client(&self) -> &ReqwestClient {
        &self.inner
    }

    pub async fn execute(&self, req: Request) -> Result<Response, ReqwestError> {
        self.limiter.until_ready().await;
        self.inner.execute(req).await
    }
}
