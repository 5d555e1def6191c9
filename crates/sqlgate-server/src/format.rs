//! Rendering results and errors as Slack mrkdwn.
//!
//! Tables go inside a fenced block so Slack keeps the columns aligned
//! in a monospace font; the row summary trails the block in italics.

use sqlgate_core::GatewayError;
use sqlgate_types::{Cell, ResultSet};

/// Render a normalized result as a mrkdwn table.
#[must_use]
pub fn format_result(result: &ResultSet) -> String {
    if result.columns.is_empty() {
        return "No results found".to_string();
    }
    if result.rows.is_empty() {
        return "No data returned".to_string();
    }

    let header = result
        .columns
        .iter()
        .map(|column| column.name.as_str())
        .collect::<Vec<_>>()
        .join(" | ");
    let separator = vec!["---"; result.columns.len()].join(" | ");
    let body = result
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(Cell::to_string)
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut message = format!("```\n{header}\n{separator}\n{body}");
    if result.truncated {
        let hidden = result.total_rows.saturating_sub(result.row_count());
        message.push_str(&format!("\n... and {hidden} more rows"));
    }
    message.push_str(&format!("\n```\n_Query returned {}_", result.summary()));
    message
}

/// Render a gateway failure as a warning block.
#[must_use]
pub fn format_error(err: &GatewayError) -> String {
    format!("```\n⚠️ {}\n```", err.user_message())
}
