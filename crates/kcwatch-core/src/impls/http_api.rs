//! HttpConnectApi - reqwest による ConnectApi 実装
//!
//! # 方針
//! - timeout / retry は `RequestPolicy` で指定（デフォルトはどちらもなし）
//! - retry は固定間隔。指数バックオフはしない
//! - 非 2xx は `ApiError::Status`。restart のレスポンス body は読まない
//! - connector 名は 1 つのパスセグメントとして percent-encode する

use std::future::Future;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{RequestPolicy, WatchdogConfig};
use crate::domain::{ConnectorName, ConnectorStatus, TaskRef};
use crate::error::{ApiError, WatchdogError};
use crate::ports::ConnectApi;

pub struct HttpConnectApi {
    client: reqwest::Client,
    base_url: String,
    base: Url,
    policy: RequestPolicy,
}

impl HttpConnectApi {
    /// `base_url` must already be normalized (scheme present, no trailing slash).
    ///
    /// # Errors
    ///
    /// Returns `WatchdogError::InvalidHost` if `base_url` is not an absolute
    /// URL with a path, and `WatchdogError::Client` if the HTTP client cannot
    /// be built (e.g. TLS backend initialization failure).
    pub fn new(base_url: impl Into<String>, policy: RequestPolicy) -> Result<Self, WatchdogError> {
        let base_url = base_url.into();
        let base = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| WatchdogError::InvalidHost(base_url.clone()))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("kcwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(WatchdogError::Client)?;

        Ok(Self {
            client,
            base_url,
            base,
            policy,
        })
    }

    pub fn from_config(config: &WatchdogConfig) -> Result<Self, WatchdogError> {
        Self::new(config.base_url.clone(), config.request.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Append `segments` to the base path. Each segment is percent-encoded,
    /// so `/`, `?` and `#` inside a connector name stay inside its segment.
    fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.base.clone();
        // base は new() で cannot-be-a-base を弾いているので Err にはならない
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }

    fn connectors_url(&self) -> String {
        self.endpoint(&["connectors"])
    }

    fn status_url(&self, connector: &ConnectorName) -> String {
        self.endpoint(&["connectors", connector.as_str(), "status"])
    }

    fn restart_url(&self, task: &TaskRef) -> String {
        let task_id = task.task_id().to_string();
        self.endpoint(&[
            "connectors",
            task.connector().as_str(),
            "tasks",
            task_id.as_str(),
            "restart",
        ])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let body = self.with_retry("GET", url, || self.get_once(url)).await?;
        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn get_once(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| ApiError::Read {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(body.to_vec())
    }

    async fn post_empty_once(&self, url: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(Vec::new())
            .send()
            .await
            .map_err(|source| ApiError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// Run `operation` under the request policy: optional timeout per attempt,
    /// fixed delay between attempts, no retry for non-retryable errors.
    async fn with_retry<F, Fut, T>(
        &self,
        method: &'static str,
        url: &str,
        mut operation: F,
    ) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let attempts = self.policy.attempts();
        let mut attempt = 1;
        loop {
            let result = match self.policy.timeout {
                Some(limit) => match tokio::time::timeout(limit, operation()).await {
                    Ok(result) => result,
                    Err(_) => Err(ApiError::Timeout {
                        url: url.to_string(),
                        timeout_ms: limit.as_millis(),
                    }),
                },
                None => operation().await,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    debug!(
                        method,
                        url,
                        attempt,
                        delay_ms = self.policy.retry_delay.as_millis() as u64,
                        error = %e,
                        "request failed, will retry"
                    );
                    tokio::time::sleep(self.policy.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl ConnectApi for HttpConnectApi {
    async fn list_connectors(&self) -> Result<Vec<ConnectorName>, ApiError> {
        let url = self.connectors_url();
        self.get_json(&url).await
    }

    async fn connector_status(
        &self,
        connector: &ConnectorName,
    ) -> Result<ConnectorStatus, ApiError> {
        let url = self.status_url(connector);
        self.get_json(&url).await
    }

    async fn restart_task(&self, task: &TaskRef) -> Result<(), ApiError> {
        let url = self.restart_url(task);
        self.with_retry("POST", &url, || self.post_empty_once(&url))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> HttpConnectApi {
        HttpConnectApi::new("http://connect:8083", RequestPolicy::default()).unwrap()
    }

    #[test]
    fn builds_management_api_urls() {
        let api = api();
        let name = ConnectorName::new("orders-sink");

        assert_eq!(api.connectors_url(), "http://connect:8083/connectors");
        assert_eq!(
            api.status_url(&name),
            "http://connect:8083/connectors/orders-sink/status"
        );
        assert_eq!(
            api.restart_url(&TaskRef::new(name, 3)),
            "http://connect:8083/connectors/orders-sink/tasks/3/restart"
        );
    }

    #[test]
    fn connector_names_are_encoded_as_single_path_segments() {
        let api = api();
        let name = ConnectorName::new("team/orders?x=1#frag");

        assert_eq!(
            api.status_url(&name),
            "http://connect:8083/connectors/team%2Forders%3Fx=1%23frag/status"
        );
        assert_eq!(
            api.restart_url(&TaskRef::new(name, 0)),
            "http://connect:8083/connectors/team%2Forders%3Fx=1%23frag/tasks/0/restart"
        );
    }

    #[test]
    fn keeps_a_base_path_prefix() {
        let api = HttpConnectApi::new("http://gateway:8080/kafka-connect", RequestPolicy::default())
            .unwrap();
        assert_eq!(
            api.connectors_url(),
            "http://gateway:8080/kafka-connect/connectors"
        );
    }

    #[test]
    fn from_config_uses_normalized_base_url() {
        let config =
            WatchdogConfig::new("connect:8083/", std::time::Duration::from_secs(60)).unwrap();
        let api = HttpConnectApi::from_config(&config).unwrap();
        assert_eq!(api.base_url(), "http://connect:8083");
    }

    #[test]
    fn host_whose_name_starts_with_http_gets_a_scheme() {
        let config =
            WatchdogConfig::new("httpd-connect:8083/", std::time::Duration::from_secs(60))
                .unwrap();
        let api = HttpConnectApi::from_config(&config).unwrap();

        assert_eq!(api.base_url(), "http://httpd-connect:8083");
        assert_eq!(api.connectors_url(), "http://httpd-connect:8083/connectors");
    }

    #[test]
    fn rejects_base_url_without_scheme() {
        assert!(matches!(
            HttpConnectApi::new("connect:8083", RequestPolicy::default()),
            Err(WatchdogError::InvalidHost(_))
        ));
    }
}
