//! Delivery client posting events to subscriber endpoints

use crate::signature::headers;
use crate::{
    DeliveryClientConfig, DeliveryOptions, RelayError, Result, SubscriptionDeliveryResult,
    SubscriptionRelayConfig, WebhookSignature,
};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, StatusCode, redirect};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Status recorded when no attempt produced a response
const NO_RESPONSE_STATUS: StatusCode = StatusCode::SERVICE_UNAVAILABLE;

/// Client for delivering one event to one subscriber
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    config: DeliveryClientConfig,
    http_client: Client,
    insecure_client: Client,
}

/// How a single attempt ended
enum Attempt {
    Delivered(StatusCode),
    Rejected(StatusCode),
    Failed(StatusCode),
    NoResponse(String),
}

impl DeliveryClient {
    /// Create a new delivery client.
    ///
    /// Builds one HTTP client that verifies certificates and one that does
    /// not, used for subscriptions with `is_insecure_ssl_allowed`.
    pub fn new(config: DeliveryClientConfig) -> Result<Self> {
        let http_client = Self::build_http_client(&config, false)?;
        let insecure_client = Self::build_http_client(&config, true)?;

        Ok(Self {
            config,
            http_client,
            insecure_client,
        })
    }

    fn build_http_client(config: &DeliveryClientConfig, accept_invalid_certs: bool) -> Result<Client> {
        Ok(Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .redirect(redirect::Policy::none())
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?)
    }

    /// Deliver `payload` to one subscriber.
    ///
    /// Always yields exactly one result describing the final attempt;
    /// delivery failures are recorded in the result, never returned as errors.
    pub async fn deliver<T: Serialize + ?Sized>(
        &self,
        subscription: &SubscriptionRelayConfig,
        event_name: &str,
        payload: &T,
        options: &DeliveryOptions,
    ) -> Result<SubscriptionDeliveryResult> {
        self.deliver_with_cancel(subscription, event_name, payload, options, &CancellationToken::new())
            .await
    }

    /// Deliver `payload` to one subscriber, aborting when `cancel` fires.
    ///
    /// Cancellation during an attempt or a backoff returns
    /// [`RelayError::Cancelled`] and no result.
    pub async fn deliver_with_cancel<T: Serialize + ?Sized>(
        &self,
        subscription: &SubscriptionRelayConfig,
        event_name: &str,
        payload: &T,
        options: &DeliveryOptions,
        cancel: &CancellationToken,
    ) -> Result<SubscriptionDeliveryResult> {
        subscription.validate()?;
        if event_name.is_empty() {
            return Err(RelayError::invalid("event name must not be empty"));
        }
        let url = subscription.config.parsed_url()?;
        let content_type = HeaderValue::from_str(subscription.config.effective_content_type())
            .map_err(|e| RelayError::invalid(format!("invalid content type: {}", e)))?;
        let event_header = HeaderValue::from_str(event_name)
            .map_err(|e| RelayError::invalid(format!("invalid event name: {}", e)))?;

        let body = serde_json::to_vec(payload)?;
        if body.len() > self.config.max_payload_size {
            warn!(
                target: "hookrelay::delivery",
                subscription_id = %subscription.subscription_id,
                event = %event_name,
                size = body.len(),
                max = self.config.max_payload_size,
                "Payload too large, not delivering"
            );
            return Ok(SubscriptionDeliveryResult::new(
                &subscription.subscription_id,
                StatusCode::PAYLOAD_TOO_LARGE.as_u16(),
                format!(
                    "Payload Too Large: {} bytes (max: {})",
                    body.len(),
                    self.config.max_payload_size
                ),
                0,
            ));
        }

        let signature = subscription
            .config
            .signing_secret()
            .map(|secret| WebhookSignature::sign(&body, secret))
            .transpose()?;

        let client = if subscription.config.is_insecure_ssl_allowed {
            &self.insecure_client
        } else {
            &self.http_client
        };
        let policy = &options.retry;
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(RelayError::Cancelled);
            }
            attempt += 1;

            let delivery_id = Uuid::new_v4().simple().to_string();
            debug!(
                target: "hookrelay::delivery",
                subscription_id = %subscription.subscription_id,
                event = %event_name,
                url = %url,
                attempt,
                delivery_id = %delivery_id,
                "Webhook delivery attempt"
            );

            let mut request = client
                .post(url.clone())
                .timeout(options.timeout)
                .header(CONTENT_TYPE, content_type.clone())
                .header(headers::EVENT, event_header.clone())
                .header(headers::DELIVERY, delivery_id)
                .body(body.clone());
            if let Some(signature) = &signature {
                request = request.header(headers::SIGNATURE, signature);
            }

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(RelayError::Cancelled),
                response = request.send() => match response {
                    Ok(response) => classify_status(response.status()),
                    Err(e) => Attempt::NoResponse(e.to_string()),
                },
            };

            let retry = match outcome {
                Attempt::Delivered(status) => {
                    info!(
                        target: "hookrelay::delivery",
                        subscription_id = %subscription.subscription_id,
                        event = %event_name,
                        status = status.as_u16(),
                        attempt,
                        "Webhook delivered"
                    );
                    return Ok(status_result(subscription, status, attempt));
                }
                Attempt::Rejected(status) => {
                    warn!(
                        target: "hookrelay::delivery",
                        subscription_id = %subscription.subscription_id,
                        event = %event_name,
                        status = status.as_u16(),
                        attempt,
                        "Webhook rejected by subscriber, not retrying"
                    );
                    return Ok(status_result(subscription, status, attempt));
                }
                Attempt::Failed(status) => {
                    if !policy.should_retry(attempt) {
                        warn!(
                            target: "hookrelay::delivery",
                            subscription_id = %subscription.subscription_id,
                            event = %event_name,
                            status = status.as_u16(),
                            attempts = attempt,
                            "Webhook delivery failed"
                        );
                        return Ok(status_result(subscription, status, attempt));
                    }
                    format!("status {}", status.as_u16())
                }
                Attempt::NoResponse(error) => {
                    if !policy.should_retry(attempt) {
                        warn!(
                            target: "hookrelay::delivery",
                            subscription_id = %subscription.subscription_id,
                            event = %event_name,
                            url = %url,
                            attempts = attempt,
                            error = %error,
                            "Webhook delivery failed, no response"
                        );
                        return Ok(SubscriptionDeliveryResult::new(
                            &subscription.subscription_id,
                            NO_RESPONSE_STATUS.as_u16(),
                            format!(
                                "{}: no response from {} after {} attempt(s): {}",
                                reason(NO_RESPONSE_STATUS),
                                url,
                                attempt,
                                error
                            ),
                            attempt,
                        ));
                    }
                    error
                }
            };

            let delay = policy.delay_for_attempt(attempt);
            debug!(
                target: "hookrelay::delivery",
                subscription_id = %subscription.subscription_id,
                attempt,
                reason = %retry,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retrying webhook delivery"
            );
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(RelayError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &DeliveryClientConfig {
        &self.config
    }
}

/// Sort a response status into success, terminal or retryable
fn classify_status(status: StatusCode) -> Attempt {
    if status.is_success() {
        Attempt::Delivered(status)
    } else if is_terminal_status(status) {
        Attempt::Rejected(status)
    } else {
        Attempt::Failed(status)
    }
}

/// Statuses the subscriber will keep returning for the same request
fn is_terminal_status(status: StatusCode) -> bool {
    matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED)
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

fn status_result(
    subscription: &SubscriptionRelayConfig,
    status: StatusCode,
    attempts: u32,
) -> SubscriptionDeliveryResult {
    SubscriptionDeliveryResult::new(
        &subscription.subscription_id,
        status.as_u16(),
        reason(status),
        attempts,
    )
}
