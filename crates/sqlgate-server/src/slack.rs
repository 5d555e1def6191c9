//! Slack request verification and message delivery.
//!
//! Inbound slash commands are authenticated with Slack's signed-secrets
//! scheme: `v0=hex(HMAC-SHA256(secret, "v0:{timestamp}:{body}"))`, with
//! a freshness window against replay. Outbound messages go to the
//! command's `response_url` as JSON.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlgate_core::sanitize_message;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Signature scheme version Slack currently issues.
const SIGNATURE_VERSION: &str = "v0";

/// Maximum accepted clock skew between Slack and this server.
const FRESHNESS_WINDOW_SECS: i64 = 60 * 5;

/// How long a delivery to a `response_url` may take.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Why an inbound request failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// A required Slack header was absent.
    #[error("missing header: {0}")]
    MissingHeader(&'static str),

    /// The timestamp header was not a decimal integer.
    #[error("invalid request timestamp")]
    InvalidTimestamp,

    /// The timestamp fell outside the freshness window.
    #[error("request timestamp outside the freshness window")]
    Stale,

    /// The signature did not match the request body.
    #[error("signature mismatch")]
    Mismatch,
}

/// Verifies Slack request signatures against the signing secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl SignatureVerifier {
    /// Create a verifier for the workspace signing secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify a request against the current wall clock.
    pub fn verify(
        &self,
        timestamp: &str,
        body: &[u8],
        signature: &str,
    ) -> Result<(), SignatureError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        self.verify_at(timestamp, body, signature, now)
    }

    /// Verify a request as of the given Unix time.
    ///
    /// Checks happen cheapest-first: timestamp syntax, freshness, then
    /// the HMAC itself. The digest comparison is constant-time.
    pub fn verify_at(
        &self,
        timestamp: &str,
        body: &[u8],
        signature: &str,
        now: i64,
    ) -> Result<(), SignatureError> {
        let issued: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        if (now - issued).abs() > FRESHNESS_WINDOW_SECS {
            return Err(SignatureError::Stale);
        }

        let provided = signature
            .strip_prefix(SIGNATURE_VERSION)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or(SignatureError::Mismatch)?;
        let provided = hex::decode(provided).map_err(|_| SignatureError::Mismatch)?;

        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mac) => mac,
            // HMAC-SHA256 accepts keys of any length.
            Err(_) => unreachable!(),
        };
        mac.update(SIGNATURE_VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        mac.verify_slice(&provided)
            .map_err(|_| SignatureError::Mismatch)
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

/// A parsed slash-command payload.
///
/// Every field defaults to empty so that payload changes on Slack's
/// side never turn into parse failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlashCommand {
    /// The command that was typed, e.g. `/ask-data`.
    #[serde(default)]
    pub command: String,
    /// Everything after the command name.
    #[serde(default)]
    pub text: String,
    /// Webhook URL for delayed responses.
    #[serde(default)]
    pub response_url: String,
    /// Invoking user's ID.
    #[serde(default)]
    pub user_id: String,
    /// Invoking user's handle.
    #[serde(default)]
    pub user_name: String,
    /// Channel the command was typed in.
    #[serde(default)]
    pub channel_id: String,
    /// Unique ID for this invocation.
    #[serde(default)]
    pub trigger_id: String,
}

/// A message posted back to Slack.
#[derive(Debug, Clone, Serialize)]
pub struct SlackMessage {
    /// `ephemeral` or `in_channel`; Slack defaults to ephemeral.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<&'static str>,
    /// Message body.
    pub text: String,
    /// Ask Slack to render mrkdwn formatting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mrkdwn: Option<bool>,
}

impl SlackMessage {
    /// An ephemeral message, visible only to the invoking user.
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: Some("ephemeral"),
            text: text.into(),
            mrkdwn: None,
        }
    }

    /// A mrkdwn-formatted message for `response_url` delivery.
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            response_type: None,
            text: text.into(),
            mrkdwn: Some(true),
        }
    }
}

/// Failure to deliver a message to Slack.
#[derive(Debug, Error)]
pub enum SlackError {
    /// The POST to the `response_url` failed or was refused.
    #[error("failed to deliver message to Slack: {0}")]
    Delivery(String),
}

/// Post a delayed response to the command's `response_url`.
pub async fn post_response(
    client: &reqwest::Client,
    response_url: &str,
    message: &SlackMessage,
) -> Result<(), SlackError> {
    let response = client
        .post(response_url)
        .timeout(DELIVERY_TIMEOUT)
        .json(message)
        .send()
        .await
        .map_err(|err| SlackError::Delivery(sanitize_message(&err.to_string())))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SlackError::Delivery(format!(
            "Slack responded with {status}"
        )));
    }
    tracing::debug!("response delivered to Slack");
    Ok(())
}
