//! # sqlgate-server
//!
//! Slack slash-command service that turns natural-language questions
//! into SQL, runs them through the safety gateway, and posts the
//! results back as mrkdwn tables.
//!
//! Request path: Slack signs the slash command; [`routes`] verifies the
//! signature and acks within Slack's three-second window; a background
//! task asks [`translate::GroqTranslator`] for SQL, hands it to the
//! gateway, renders the outcome with [`format`], and delivers it to the
//! command's `response_url`.
//!
//! Configuration comes entirely from environment variables; see
//! [`config::ServerConfig`].

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod format;
pub mod routes;
pub mod slack;
pub mod translate;

pub use config::{ConfigError, ServerConfig};
pub use routes::{router, AppState, GatewayHandler, QueryHandler};
pub use slack::{SignatureError, SignatureVerifier, SlackMessage, SlashCommand};
pub use translate::GroqTranslator;
