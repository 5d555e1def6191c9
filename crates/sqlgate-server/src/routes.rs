//! HTTP surface.
//!
//! Slack gives a slash command three seconds to answer, so the endpoint
//! verifies the signature, acks immediately, and finishes the real work
//! in a background task that posts to the command's `response_url`.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/slack/slash-command` | Signed slash-command entry point |
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/` | Service banner |

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use sqlgate_core::{Connector, Gateway, Translator};

use crate::format::{format_error, format_result};
use crate::slack::{post_response, SignatureError, SignatureVerifier, SlackMessage, SlashCommand};

/// Longest accepted question, in characters.
pub const MAX_QUESTION_CHARS: usize = 500;

const USAGE_HELP: &str = "Please ask a question.\nExample: `/ask-data show revenue by region`";

/// Answers one question end to end.
///
/// The seam between the HTTP layer and the gateway; router tests swap
/// in a mock so they run without a database.
#[async_trait]
pub trait QueryHandler: Send + Sync + 'static {
    /// Produce the mrkdwn reply for a question.
    async fn answer(&self, question: &str, correlation_id: &str) -> String;
}

/// [`QueryHandler`] backed by a gateway and a translator.
///
/// The gateway stays shared with the caller so the binary can close its
/// pool after the listener stops.
pub struct GatewayHandler<C: Connector> {
    gateway: Arc<Gateway<C>>,
    translator: Box<dyn Translator>,
}

impl<C: Connector> GatewayHandler<C> {
    /// Bundle a gateway with the translator it consults.
    pub fn new(gateway: Arc<Gateway<C>>, translator: impl Translator + 'static) -> Self {
        Self {
            gateway,
            translator: Box::new(translator),
        }
    }
}

#[async_trait]
impl<C: Connector> QueryHandler for GatewayHandler<C> {
    async fn answer(&self, question: &str, correlation_id: &str) -> String {
        match self
            .gateway
            .handle_query(self.translator.as_ref(), question, correlation_id)
            .await
        {
            Ok(result) => format_result(&result),
            Err(err) => format_error(&err),
        }
    }
}

/// State shared by all routes.
#[derive(Clone)]
pub struct AppState {
    verifier: SignatureVerifier,
    handler: Arc<dyn QueryHandler>,
    http: reqwest::Client,
}

impl AppState {
    /// Assemble the route state.
    pub fn new(verifier: SignatureVerifier, handler: impl QueryHandler) -> Self {
        Self {
            verifier,
            handler: Arc::new(handler),
            http: reqwest::Client::new(),
        }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/slack/slash-command", post(slash_command))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// `GET /health` — liveness probe.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// `GET /` — service banner.
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "service": "sqlgate", "status": "running" }))
}

/// `POST /slack/slash-command` — verify, ack, process in background.
async fn slash_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if let Err(err) = verify_request(&state.verifier, &headers, &body) {
        tracing::warn!(error = %err, "rejected slash command");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "invalid request signature".to_string(),
            }),
        )
            .into_response();
    }

    let command: SlashCommand = match serde_urlencoded::from_bytes(&body) {
        Ok(command) => command,
        Err(err) => {
            tracing::warn!(error = %err, "malformed slash command payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "malformed form payload".to_string(),
                }),
            )
                .into_response();
        }
    };

    tracing::info!(
        user_id = %command.user_id,
        channel_id = %command.channel_id,
        question = %command.text.trim().chars().take(50).collect::<String>(),
        "slash command received"
    );

    tokio::spawn(process_command(state, command));

    Json(SlackMessage::ephemeral("Processing your request...")).into_response()
}

fn verify_request(
    verifier: &SignatureVerifier,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), SignatureError> {
    let timestamp = header_str(headers, "x-slack-request-timestamp")?;
    let signature = header_str(headers, "x-slack-signature")?;
    verifier.verify(timestamp, body, signature)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, SignatureError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or(SignatureError::MissingHeader(name))
}

/// Background half of the slash command: answer, then deliver.
async fn process_command(state: AppState, command: SlashCommand) {
    let reply = build_reply(state.handler.as_ref(), &command).await;

    if command.response_url.is_empty() {
        tracing::warn!("slash command carried no response_url, dropping reply");
        return;
    }
    if let Err(err) = post_response(&state.http, &command.response_url, &reply).await {
        tracing::error!(error = %err, "failed to deliver reply");
    }
}

async fn build_reply(handler: &dyn QueryHandler, command: &SlashCommand) -> SlackMessage {
    let question = command.text.trim();
    if question.is_empty() {
        return SlackMessage::mrkdwn(USAGE_HELP);
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return SlackMessage::mrkdwn(format!(
            "Question too long (max {MAX_QUESTION_CHARS} characters)."
        ));
    }

    let correlation_id = if command.trigger_id.is_empty() {
        &command.user_id
    } else {
        &command.trigger_id
    };
    SlackMessage::mrkdwn(handler.answer(question, correlation_id).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::Request;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tower::ServiceExt;

    const SECRET: &str = "test-signing-secret";

    struct MockHandler {
        reply: &'static str,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockHandler {
        fn new(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl QueryHandler for Arc<MockHandler> {
        async fn answer(&self, question: &str, correlation_id: &str) -> String {
            self.calls
                .lock()
                .unwrap()
                .push((question.to_string(), correlation_id.to_string()));
            self.reply.to_string()
        }
    }

    fn test_app(handler: Arc<MockHandler>) -> Router {
        router(AppState::new(SignatureVerifier::new(SECRET), handler))
    }

    fn now_string() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            .to_string()
    }

    fn sign(timestamp: &str, body: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("v0:{timestamp}:{body}").as_bytes());
        format!("v0={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn signed_request(body: &str) -> Request<Body> {
        let timestamp = now_string();
        let signature = sign(&timestamp, body);
        Request::builder()
            .method("POST")
            .uri("/slack/slash-command")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-slack-request-timestamp", timestamp)
            .header("x-slack-signature", signature)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app(MockHandler::new("ok"));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_root_banner() {
        let app = test_app(MockHandler::new("ok"));
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "running");
    }

    #[tokio::test]
    async fn test_unsigned_request_rejected() {
        let handler = MockHandler::new("should never run");
        let app = test_app(Arc::clone(&handler));

        let req = Request::builder()
            .method("POST")
            .uri("/slack/slash-command")
            .body(Body::from("text=hi"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(handler.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let handler = MockHandler::new("should never run");
        let app = test_app(Arc::clone(&handler));

        let req = Request::builder()
            .method("POST")
            .uri("/slack/slash-command")
            .header("x-slack-request-timestamp", now_string())
            .header("x-slack-signature", "v0=deadbeef")
            .body(Body::from("text=hi"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"], "invalid request signature");
        assert!(handler.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signed_command_acks_immediately() {
        let app = test_app(MockHandler::new("the answer"));
        // Port 9 refuses instantly, so the background delivery attempt
        // cannot leave the host.
        let resp = app
            .oneshot(signed_request(
                "text=show+revenue&user_id=U1&trigger_id=T9\
                 &response_url=http%3A%2F%2F127.0.0.1%3A9%2Fhook",
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let ack = body_json(resp).await;
        assert_eq!(ack["text"], "Processing your request...");
        assert_eq!(ack["response_type"], "ephemeral");
    }

    #[tokio::test]
    async fn test_reply_for_question_uses_handler() {
        let handler = MockHandler::new("*Results*");
        let command = SlashCommand {
            text: "  show revenue  ".to_string(),
            user_id: "U1".to_string(),
            trigger_id: "T9".to_string(),
            ..SlashCommand::default()
        };

        let reply = build_reply(&handler, &command).await;
        assert_eq!(reply.text, "*Results*");
        assert_eq!(reply.mrkdwn, Some(true));

        let calls = handler.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[("show revenue".to_string(), "T9".to_string())]);
    }

    #[tokio::test]
    async fn test_reply_falls_back_to_user_id_correlation() {
        let handler = MockHandler::new("x");
        let command = SlashCommand {
            text: "q".to_string(),
            user_id: "U1".to_string(),
            ..SlashCommand::default()
        };

        build_reply(&handler, &command).await;
        assert_eq!(handler.calls.lock().unwrap()[0].1, "U1");
    }

    #[tokio::test]
    async fn test_empty_question_gets_usage_help() {
        let handler = MockHandler::new("should never run");
        let command = SlashCommand {
            text: "   ".to_string(),
            ..SlashCommand::default()
        };

        let reply = build_reply(&handler, &command).await;
        assert!(reply.text.contains("Please ask a question"));
        assert!(handler.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlong_question_rejected() {
        let handler = MockHandler::new("should never run");
        let command = SlashCommand {
            text: "x".repeat(MAX_QUESTION_CHARS + 1),
            ..SlashCommand::default()
        };

        let reply = build_reply(&handler, &command).await;
        assert_eq!(reply.text, "Question too long (max 500 characters).");
        assert!(handler.calls.lock().unwrap().is_empty());
    }
}
