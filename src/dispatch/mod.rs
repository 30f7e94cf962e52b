//! Outbound verification-code delivery
//!
//! Delivery runs on a detached task so the triggering request never
//! blocks on provider latency. Failures are logged and counted but
//! not retried or surfaced to the caller.

use std::future::Future;

use crate::data::CodeChannel;
use crate::error::AppError;
use crate::metrics::CODE_DELIVERIES_TOTAL;

/// A verification code addressed to one channel
#[derive(Debug, Clone)]
pub struct CodeMessage {
    pub channel: CodeChannel,
    /// Email address or phone number, depending on channel
    pub recipient: String,
    pub code: String,
    /// Lifetime communicated to the user, in seconds
    pub ttl_seconds: i64,
}

impl CodeMessage {
    /// Render the message body sent to the user.
    pub fn body(&self) -> String {
        format!(
            "Your confirmation code is: {}\nIt expires in {} minutes!",
            self.code,
            self.ttl_seconds / 60
        )
    }
}

/// Hand a message to the configured provider.
///
/// Provider integration (SMTP / SMS gateway) is wired in by the
/// deployment; the default transport logs the dispatch.
async fn deliver(message: CodeMessage) -> Result<(), AppError> {
    tracing::info!(
        channel = message.channel.as_str(),
        recipient = %message.recipient,
        "Dispatching verification code"
    );
    tracing::debug!(body = %message.body(), "Verification message body");
    Ok(())
}

/// Fire-and-forget delivery of one code message.
pub fn spawn_code_delivery(message: CodeMessage) {
    let channel = message.channel.as_str();
    spawn_best_effort(channel, deliver(message));
}

/// Spawn a detached delivery task that only reports through logs/metrics.
fn spawn_best_effort<F>(channel: &'static str, future: F)
where
    F: Future<Output = Result<(), AppError>> + Send + 'static,
{
    tokio::spawn(async move {
        match future.await {
            Ok(()) => {
                CODE_DELIVERIES_TOTAL
                    .with_label_values(&[channel, "success"])
                    .inc();
            }
            Err(error) => {
                CODE_DELIVERIES_TOTAL
                    .with_label_values(&[channel, "error"])
                    .inc();
                tracing::warn!(
                    channel,
                    %error,
                    "Verification code delivery failed (no retry policy configured)"
                );
            }
        }
    });
}
