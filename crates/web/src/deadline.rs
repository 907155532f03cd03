use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::WebError;

/// Wall-clock budget for one request. Every downstream call made while
/// handling the request runs under the same expiry.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now() + budget,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Runs a downstream call, failing with `WebError::Timeout` once the
    /// deadline passes. The call's own error converts into `WebError`.
    pub async fn run<F, T, E>(&self, operation: &'static str, call: F) -> Result<T, WebError>
    where
        F: Future<Output = Result<T, E>>,
        WebError: From<E>,
    {
        match tokio::time::timeout_at(self.expires_at, call).await {
            Ok(result) => result.map_err(WebError::from),
            Err(_) => {
                tracing::warn!(operation, "Deadline exceeded");
                Err(WebError::Timeout(operation))
            }
        }
    }
}
