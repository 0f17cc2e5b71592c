use std::time::Duration;

use tracing::Level;
use tracing::event;

/// Summary of one logical call, including a refresh-and-retry if one happened.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub operation: String,
    pub attempts: u8,
    pub refreshed: bool,
    pub success: bool,
    pub total_delay: Duration,
}

impl RetryOutcome {
    pub fn log(&self) {
        event!(
            Level::INFO,
            operation = %self.operation,
            attempts = self.attempts,
            refreshed = self.refreshed,
            success = self.success,
            total_delay_ms = self.total_delay.as_millis() as u64,
            "request.outcome"
        );
    }
}
