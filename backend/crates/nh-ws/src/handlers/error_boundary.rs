use crate::{HandlerContext, Result as WsErrorResult, ServerFrame, WsError};

use std::panic::Location;

use error_location::ErrorLocation;
use log::error;

/// Execute a handler with panic recovery.
///
/// A panic becomes `WsError::HandlerFault`, which tears down only this
/// connection.
pub async fn with_error_boundary<F, Fut>(
    ctx: &HandlerContext,
    handler_name: &str,
    handler: F,
) -> WsErrorResult<ServerFrame>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = WsErrorResult<ServerFrame>> + Send + 'static,
{
    let result = tokio::spawn(async move { handler().await }).await;

    match result {
        Ok(response) => response,
        Err(join_error) => {
            let panic_msg = if join_error.is_panic() {
                match join_error.into_panic().downcast::<String>() {
                    Ok(msg) => *msg,
                    Err(any) => match any.downcast::<&str>() {
                        Ok(msg) => msg.to_string(),
                        Err(_) => "Unknown panic".to_string(),
                    },
                }
            } else {
                "Task cancelled".to_string()
            };

            error!(
                "{} Handler {} panicked: {}",
                ctx.log_prefix(),
                handler_name,
                panic_msg
            );

            Err(WsError::HandlerFault {
                message: panic_msg,
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}
