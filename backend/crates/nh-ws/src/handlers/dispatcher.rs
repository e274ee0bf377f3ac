use crate::handlers::channel::{handle_create_channel, handle_list_channels};
use crate::handlers::commit_ticket::CommitTicket;
use crate::handlers::error_boundary::with_error_boundary;
use crate::handlers::publish::handle_publish;
use crate::handlers::subscription::{handle_subscribe, handle_unsubscribe};
use crate::{ClientCommand, HandlerContext, Result as WsErrorResult, ServerFrame, WsError};

use std::panic::Location;
use std::time::Duration;

use error_location::ErrorLocation;
use log::{debug, error, warn};

/// Run one client command with panic isolation and a time limit.
pub async fn dispatch(
    command: ClientCommand,
    ctx: HandlerContext,
    timeout: Duration,
) -> WsErrorResult<ServerFrame> {
    let handler_name = command.name();
    debug!("{} -> {}", ctx.log_prefix(), handler_name);

    let ticket = CommitTicket::new(timeout);
    let inner_ctx = ctx.clone();
    let inner_ticket = ticket.clone();
    let boundary = with_error_boundary(&ctx, handler_name, move || {
        dispatch_inner(command, inner_ctx, inner_ticket)
    });
    tokio::pin!(boundary);

    let result = match tokio::time::timeout(timeout, &mut boundary).await {
        Ok(result) => result,
        Err(_elapsed) if ticket.expire() => {
            error!(
                "{} Handler {} timed out after {:?}",
                ctx.log_prefix(),
                handler_name,
                timeout
            );
            Err(WsError::Timeout {
                timeout_secs: timeout.as_secs(),
                location: ErrorLocation::from(Location::caller()),
            })
        }
        // Committed just as the timer fired; its reply is the truth
        Err(_elapsed) => boundary.await,
    };

    ctx.metrics.handler_latency(ctx.started_at.elapsed());

    match &result {
        Ok(_) => debug!(
            "{} <- {} completed in {}ms",
            ctx.log_prefix(),
            handler_name,
            ctx.elapsed_ms()
        ),
        Err(e) => {
            ctx.metrics.error_occurred(e.kind());
            warn!("{} Handler {} failed: {}", ctx.log_prefix(), handler_name, e);
        }
    }

    result
}

async fn dispatch_inner(
    command: ClientCommand,
    ctx: HandlerContext,
    ticket: CommitTicket,
) -> WsErrorResult<ServerFrame> {
    match command {
        ClientCommand::Subscribe { channel, key } => {
            handle_subscribe(channel, key, ctx, ticket).await
        }
        ClientCommand::Unsubscribe { channel } => handle_unsubscribe(channel, ctx).await,
        ClientCommand::Publish { channel, content } => handle_publish(channel, content, ctx).await,
        ClientCommand::CreateChannel { channel, owner_id } => {
            handle_create_channel(channel, owner_id, ctx).await
        }
        ClientCommand::ListChannels => handle_list_channels(ctx).await,
    }
}
