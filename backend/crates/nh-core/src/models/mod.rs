pub mod channel_name;
pub mod notification_envelope;
pub mod tenant;
