use tracing::{Level, event};
use uuid::Uuid;

use crate::errors::Error;

/// Correlates the tracing events of one credential acquisition round
/// (bootstrap or refresh) under a single attempt id.
#[derive(Clone, Debug)]
pub struct FlightTelemetry {
    attempt_id: Uuid,
    context: String,
}

impl FlightTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            context: context.into(),
        }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn emit_start(&self) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            "flight.start"
        );
    }

    pub fn emit_success(&self) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            "flight.success"
        );
    }

    pub fn emit_failure(&self, error: &Error) {
        event!(
            Level::ERROR,
            attempt_id = %self.attempt_id,
            context = %self.context,
            error = %error,
            "flight.failure"
        );
    }
}
