mod channel_name;
mod notification_envelope;
mod tenant;
