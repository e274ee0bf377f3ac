use crate::{HandlerContext, Result as WsErrorResult, ServerFrame, WsError};

use nh_core::ChannelName;

use std::panic::Location;

use error_location::ErrorLocation;
use log::{info, warn};
use serde_json::Value;

/// Client-originated publish.
///
/// Goes through the same publisher as the validation gate but without its
/// quota check; `gateway.allow_client_publish` switches it off.
pub async fn handle_publish(
    channel: ChannelName,
    content: Value,
    ctx: HandlerContext,
) -> WsErrorResult<ServerFrame> {
    if !ctx.policy.allow_client_publish {
        return Err(WsError::PublishDisabled {
            location: ErrorLocation::from(Location::caller()),
        });
    }

    if ctx.directory.lookup(channel.as_str()).await?.is_none() {
        return Err(WsError::ChannelNotFound {
            channel: channel.to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    ctx.publisher
        .publish(&ctx.sender_identity(), &channel, content)
        .await
        .map_err(|source| {
            warn!("{} Publish to {} failed: {}", ctx.log_prefix(), channel, source);
            WsError::PublishFailed {
                source,
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

    info!("{} Published to channel {}", ctx.log_prefix(), channel);

    Ok(ServerFrame::success(format!(
        "message published to {}",
        channel
    )))
}
