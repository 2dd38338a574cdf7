//! Built-in telemetry sinks.

use super::{TelemetryEvent, TelemetrySink};
use crate::error::TelemetryError;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::info;

/// Writes events to the log under the `telemetry` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl TelemetrySink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn record(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        let payload = serde_json::to_string(event).unwrap_or_default();
        info!(
            target: "telemetry",
            event = event.name(),
            issue = event.issue(),
            %payload,
            "Telemetry event"
        );
        Ok(())
    }
}

/// Posts events as JSON to an HTTP endpoint.
#[derive(Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    /// Create a webhook sink.
    ///
    /// # Errors
    /// Returns `TelemetryError::Http` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TelemetrySink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn record(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        let mut body = serde_json::to_value(event).unwrap_or_default();
        if let Some(obj) = body.as_object_mut() {
            obj.insert("timestamp".to_string(), Utc::now().to_rfc3339().into());
        }

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TelemetryError::Rejected(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_webhook_posts_event_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events"))
            .and(body_partial_json(serde_json::json!({
                "name": "classification:performed",
                "issue": 42,
                "label": "bug"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let sink = WebhookSink::new(format!("{}/events", server.uri())).unwrap();
        sink.record(&TelemetryEvent::label_applied(42, "bug"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_webhook_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let sink = WebhookSink::new(server.uri()).unwrap();
        let err = sink
            .record(&TelemetryEvent::assignee_applied(1, "alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, TelemetryError::Rejected(503)));
    }

    #[tokio::test]
    async fn test_log_sink_never_fails() {
        assert!(LogSink
            .record(&TelemetryEvent::label_applied(3, "docs"))
            .await
            .is_ok());
    }
}
