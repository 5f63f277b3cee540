use common::{CircuitBreaker, CircuitBreakerConfig, MetricsRecorder};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::ClientError;

/// JSON-over-HTTP client for one downstream service, behind a circuit breaker
pub struct ServiceClient {
    service: String,
    base_url: String,
    http: reqwest::Client,
    breaker: CircuitBreaker,
}

impl ServiceClient {
    pub fn new(
        service: &str,
        base_url: &str,
        timeout: Duration,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        let breaker = CircuitBreaker::new(
            service,
            CircuitBreakerConfig {
                timeout,
                ..CircuitBreakerConfig::default()
            },
            metrics,
        );

        Self {
            service: service.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            breaker,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// POST `body` to `path` and decode the JSON response
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        self.breaker
            .call(self.send_json(path, body))
            .await
            .map_err(|e| ClientError::from_breaker(&self.service, e))
    }

    /// POST `body` to `path`, ignoring whatever the service answers with
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<(), ClientError>
    where
        B: Serialize + Sync,
    {
        self.breaker
            .call(async {
                self.send(path, body).await?;
                Ok::<_, ClientError>(())
            })
            .await
            .map_err(|e| ClientError::from_breaker(&self.service, e))
    }

    async fn send_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self.send(path, body).await?;
        Ok(response.json::<R>().await?)
    }

    async fn send<B>(&self, path: &str, body: &B) -> Result<reqwest::Response, ClientError>
    where
        B: Serialize + Sync,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                service: self.service.clone(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}
