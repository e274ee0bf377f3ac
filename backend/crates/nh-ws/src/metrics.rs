use metrics::{counter, gauge, histogram};

/// Metrics collector for gateway operations
#[derive(Clone)]
pub struct Metrics {
    prefix: &'static str,
}

impl Metrics {
    pub fn new() -> Self {
        Self { prefix: "nh_ws" }
    }

    /// Record new connection established
    pub fn connection_established(&self) {
        counter!(format!("{}.connections.established", self.prefix)).increment(1);
        gauge!(format!("{}.connections.active", self.prefix)).increment(1.0);
    }

    /// Record connection closed
    pub fn connection_closed(&self, reason: &str) {
        counter!(format!("{}.connections.closed", self.prefix)).increment(1);
        counter!(format!("{}.connections.closed.{}", self.prefix, reason)).increment(1);
        gauge!(format!("{}.connections.active", self.prefix)).decrement(1.0);
    }

    pub fn connection_rejected(&self, reason: &str) {
        counter!(format!("{}.connections.rejected.{}", self.prefix, reason)).increment(1);
    }

    /// Record frame received from client
    pub fn frame_received(&self, frame_type: &str) {
        counter!(format!("{}.frames.received", self.prefix)).increment(1);
        counter!(format!("{}.frames.received.{}", self.prefix, frame_type)).increment(1);
    }

    /// Record reply frame queued for a client
    pub fn frame_sent(&self, frame_type: &str) {
        counter!(format!("{}.frames.sent", self.prefix)).increment(1);
        counter!(format!("{}.frames.sent.{}", self.prefix, frame_type)).increment(1);
    }

    /// Record one broker delivery fanned out to a channel
    pub fn fanout(&self, delivered: usize, dropped: usize) {
        counter!(format!("{}.fanout.messages", self.prefix)).increment(1);
        counter!(format!("{}.fanout.delivered", self.prefix)).increment(delivered as u64);
        counter!(format!("{}.fanout.dropped", self.prefix)).increment(dropped as u64);
    }

    pub fn slow_consumer(&self) {
        counter!(format!("{}.slow_consumers", self.prefix)).increment(1);
    }

    pub fn channel_created(&self) {
        counter!(format!("{}.channels.created", self.prefix)).increment(1);
        gauge!(format!("{}.channels.active", self.prefix)).increment(1.0);
    }

    pub fn channel_removed(&self) {
        counter!(format!("{}.channels.removed", self.prefix)).increment(1);
        gauge!(format!("{}.channels.active", self.prefix)).decrement(1.0);
    }

    /// Record error occurrence
    pub fn error_occurred(&self, error_type: &str) {
        counter!(format!("{}.errors.total", self.prefix)).increment(1);
        counter!(format!("{}.errors.{}", self.prefix, error_type)).increment(1);
    }

    /// Record handler latency
    pub fn handler_latency(&self, duration: std::time::Duration) {
        histogram!(format!("{}.handlers.latency_ms", self.prefix))
            .record(duration.as_millis() as f64);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
