//! Chat-log pagination via the `ViewerCardModLogsMessagesBySender` operation.
//!
//! Each page carries edges ordered newest-first; the cursor of the last
//! edge, combined with `pageInfo.hasNextPage`, drives the next request.

use chatlog_types::{ChatMessage, UserId};
use serde::Deserialize;
use serde_json::json;

use crate::{GqlClient, GqlError, Operation, parse_rfc3339};

const MOD_LOGS_MESSAGES: Operation = Operation {
    name: "ViewerCardModLogsMessagesBySender",
    hash: "eaa9b16f4d95346050e99889df096a51ffa142e49d9e2ce1ae5fae39ac7a8076",
};

/// One decoded page of a sender's chat log.
#[derive(Debug)]
pub struct ChatLogPage {
    /// Messages in the order the endpoint returns them (newest first).
    pub messages: Vec<ChatMessage>,
    /// Cursor for the next page, `None` once exhausted.
    pub next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    data: Payload,
}

#[derive(Deserialize)]
struct Payload {
    logs: Logs,
}

#[derive(Deserialize)]
struct Logs {
    messages: Messages,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Messages {
    edges: Vec<Edge>,
    page_info: PageInfo,
}

#[derive(Deserialize)]
struct Edge {
    cursor: Option<String>,
    node: MessageNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageNode {
    sent_at: String,
    sender: Sender,
    content: Content,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sender {
    display_name: String,
}

#[derive(Deserialize)]
struct Content {
    text: String,
}

/// Fetch one page of messages `sender` sent in `channel`'s chat.
///
/// Pass an empty `cursor` for the first page.
pub async fn chat_log_page(
    client: &GqlClient,
    channel: &UserId,
    sender: &UserId,
    cursor: &str,
) -> Result<ChatLogPage, GqlError> {
    let variables = json!({
        "channelID": channel.as_str(),
        "cursor": cursor,
        "senderID": sender.as_str(),
    });

    let value = client.execute(MOD_LOGS_MESSAGES, variables).await?;
    let envelope: Envelope =
        serde_json::from_value(value).map_err(|_| GqlError::MissingData("data.logs.messages"))?;

    let Messages { edges, page_info } = envelope.data.logs.messages;

    let next_cursor = if page_info.has_next_page {
        let cursor = edges
            .last()
            .and_then(|edge| edge.cursor.clone())
            .ok_or(GqlError::MissingData("edge cursor"))?;
        Some(cursor)
    } else {
        None
    };

    let messages = edges
        .into_iter()
        .map(|edge| {
            Ok(ChatMessage {
                sent_at: parse_rfc3339(&edge.node.sent_at)?,
                sender: edge.node.sender.display_name,
                text: edge.node.content.text,
            })
        })
        .collect::<Result<Vec<_>, GqlError>>()?;

    Ok(ChatLogPage {
        messages,
        next_cursor,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
}
