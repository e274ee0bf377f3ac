use crate::{HandlerContext, Result as WsErrorResult, ServerFrame};

use nh_core::ChannelName;

use log::info;

/// Create the tenant behind a channel. The directory decides conflicts.
pub async fn handle_create_channel(
    channel: ChannelName,
    owner_id: Option<String>,
    ctx: HandlerContext,
) -> WsErrorResult<ServerFrame> {
    let tenant = ctx
        .directory
        .create(channel.as_str(), owner_id.as_deref())
        .await?;

    info!(
        "{} Created channel {} (tenant {})",
        ctx.log_prefix(),
        tenant.name,
        tenant.id
    );

    Ok(ServerFrame::success(format!("channel created: {}", tenant.name)))
}

pub async fn handle_list_channels(ctx: HandlerContext) -> WsErrorResult<ServerFrame> {
    let channels = ctx.directory.list_names().await?;

    info!("{} Listed {} channel(s)", ctx.log_prefix(), channels.len());

    Ok(ServerFrame::ChannelList { channels })
}
