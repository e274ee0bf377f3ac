use crate::handlers::commit_ticket::CommitTicket;
use crate::{
    HandlerContext, JoinOutcome, LeaveOutcome, MessageValidator, Result as WsErrorResult,
    ServerFrame, WsError,
};

use nh_core::ChannelName;

use std::panic::Location;

use error_location::ErrorLocation;
use log::info;

pub async fn handle_subscribe(
    channel: ChannelName,
    key: Option<String>,
    ctx: HandlerContext,
    ticket: CommitTicket,
) -> WsErrorResult<ServerFrame> {
    let tenant = if ctx.policy.require_channel_key {
        let key = MessageValidator::validate_key_present(key.as_deref())?;
        ctx.directory
            .lookup_with_secret(channel.as_str(), key)
            .await?
            .ok_or_else(|| WsError::Unauthorized {
                message: format!("key rejected for channel {}", channel),
                location: ErrorLocation::from(Location::caller()),
            })?
    } else {
        ctx.directory
            .lookup(channel.as_str())
            .await?
            .ok_or_else(|| WsError::ChannelNotFound {
                channel: channel.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?
    };

    let outcome = ctx
        .channels
        .join_if(&channel, &ctx.connection, || ticket.commit())
        .await?;

    info!(
        "{} Subscribe: channel={} tenant={} ({:?})",
        ctx.log_prefix(),
        channel,
        tenant.id,
        outcome
    );

    Ok(match outcome {
        JoinOutcome::Joined => ServerFrame::success(format!("subscribed to {}", channel)),
        JoinOutcome::AlreadyMember => {
            ServerFrame::success(format!("already subscribed to {}", channel))
        }
        // The client was already told the request timed out
        JoinOutcome::Abandoned => {
            return Err(WsError::Timeout {
                timeout_secs: ticket.timeout().as_secs(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    })
}

pub async fn handle_unsubscribe(
    channel: ChannelName,
    ctx: HandlerContext,
) -> WsErrorResult<ServerFrame> {
    let outcome = ctx.channels.leave(channel.as_str(), &ctx.connection).await;

    info!(
        "{} Unsubscribe: channel={} ({:?})",
        ctx.log_prefix(),
        channel,
        outcome
    );

    Ok(match outcome {
        LeaveOutcome::Left => ServerFrame::success(format!("unsubscribed from {}", channel)),
        LeaveOutcome::NotMember => ServerFrame::success(format!("not subscribed to {}", channel)),
    })
}
