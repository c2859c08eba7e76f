//! Archived-broadcast lookup via the `FilterableVideoTower_Videos` operation.

use chatlog_types::{BroadcastsAgo, Login, StreamWindow};
use serde::Deserialize;
use serde_json::json;

use crate::{GqlClient, GqlError, Operation, parse_rfc3339};

const FILTERABLE_VIDEOS: Operation = Operation {
    name: "FilterableVideoTower_Videos",
    hash: "acea7539a293dfd30f0b0b81a263134bb5d9a7175592e14ac3f7c77b192de416",
};

#[derive(Deserialize)]
struct Envelope {
    data: Payload,
}

#[derive(Deserialize)]
struct Payload {
    user: Option<User>,
}

#[derive(Deserialize)]
struct User {
    videos: Videos,
}

#[derive(Deserialize)]
struct Videos {
    edges: Vec<Edge>,
}

#[derive(Deserialize)]
struct Edge {
    node: VideoNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoNode {
    published_at: String,
    length_seconds: u64,
}

/// Resolve the time window of a channel's Nth-most-recent archived broadcast.
///
/// The endpoint returns up to N archives newest-first, so the last edge is
/// the one asked for. A channel with fewer than N archives yields its oldest
/// available one; a channel with none is an error.
pub async fn broadcast_window(
    client: &GqlClient,
    channel: &Login,
    ago: BroadcastsAgo,
) -> Result<StreamWindow, GqlError> {
    let variables = json!({
        "broadcastType": "ARCHIVE",
        "channelOwnerLogin": channel.as_str(),
        "limit": ago.get(),
        "videoSort": "TIME",
    });

    let value = client.execute(FILTERABLE_VIDEOS, variables).await?;
    let envelope: Envelope =
        serde_json::from_value(value).map_err(|_| GqlError::MissingData("data.user.videos"))?;

    let user = envelope
        .data
        .user
        .ok_or(GqlError::MissingData("data.user"))?;
    let node = user
        .videos
        .edges
        .into_iter()
        .next_back()
        .ok_or(GqlError::NoBroadcasts)?
        .node;

    let start = parse_rfc3339(&node.published_at)?;
    Ok(StreamWindow::new(start, node.length_seconds))
}
