pub mod redis_broker_link;
mod supervisor;
