pub mod channel;
pub mod commit_ticket;
pub mod context;
pub mod dispatcher;
pub mod error_boundary;
pub mod publish;
pub mod subscription;
