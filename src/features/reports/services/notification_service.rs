use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::config::NotificationConfig;
use crate::core::error::{AppError, Result};
use crate::features::reports::lifecycle::ReportStatusChanged;

/// Receiver of report status change events
#[async_trait]
pub trait ReportNotifier: Send + Sync {
    async fn notify(&self, event: &ReportStatusChanged) -> Result<()>;
}

/// POSTs each event as JSON to a configured URL
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build webhook client: {}", e)))?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl ReportNotifier for WebhookNotifier {
    async fn notify(&self, event: &ReportStatusChanged) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Webhook responded with {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Writes events to the log. Used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl ReportNotifier for LogNotifier {
    async fn notify(&self, event: &ReportStatusChanged) -> Result<()> {
        tracing::info!(
            report_id = %event.report_id,
            previous_status = %event.previous_status,
            new_status = %event.new_status,
            owner_email = %event.owner_email,
            "Report status changed"
        );
        Ok(())
    }
}

/// Pick the notifier for the configured environment
pub fn notifier_from_config(config: &NotificationConfig) -> Result<Arc<dyn ReportNotifier>> {
    match &config.webhook_url {
        Some(url) => {
            tracing::info!("Report notifications go to webhook {}", url);
            Ok(Arc::new(WebhookNotifier::new(url.clone(), config.timeout)?))
        }
        None => {
            tracing::info!("No notification webhook configured, logging status changes");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Deliver an event on a background task, bounded by `timeout`.
///
/// Failures are logged and never reach the caller.
pub fn dispatch(notifier: Arc<dyn ReportNotifier>, event: ReportStatusChanged, timeout: Duration) {
    tokio::spawn(async move {
        match tokio::time::timeout(timeout, notifier.notify(&event)).await {
            Ok(Ok(())) => {
                tracing::debug!("Delivered status change for report {}", event.report_id);
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    "Failed to deliver status change for report {}: {}",
                    event.report_id,
                    e
                );
            }
            Err(_) => {
                tracing::warn!(
                    "Timed out delivering status change for report {} after {:?}",
                    event.report_id,
                    timeout
                );
            }
        }
    });
}
