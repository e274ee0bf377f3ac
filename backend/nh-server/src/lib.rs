pub mod error;
pub mod logger;
pub mod routes;
pub mod wiring;

pub use error::{Result, ServerError};
pub use routes::build_router;
pub use wiring::{
    CONNECTION_DRAIN_TIMEOUT, broker_options, build_app_state, drain_and_close, open_pool,
};
