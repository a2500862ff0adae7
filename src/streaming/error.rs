use tracing::warn;

use crate::engine::EngineError;

/// Policy for handling a customer whose order fetch failed
pub trait FailurePolicy: Send + Sync {
    /// Return true to emit a degraded record and continue, false to abort the joined stream
    fn handle_order_error(&self, error: &EngineError) -> bool;
}

/// Abort the joined stream on the first order-fetch failure
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnError;

impl FailurePolicy for AbortOnError {
    fn handle_order_error(&self, error: &EngineError) -> bool {
        warn!(customer_id = error.customer().id, error = %error, "Order fetch failed, aborting joined stream");
        false
    }
}

/// Isolate the failure to its customer and keep going (logged)
#[derive(Debug, Clone, Copy, Default)]
pub struct IsolateErrors;

impl FailurePolicy for IsolateErrors {
    fn handle_order_error(&self, error: &EngineError) -> bool {
        warn!(customer_id = error.customer().id, error = %error, "Order fetch failed, emitting degraded record");
        true
    }
}

/// Isolate failures without logging
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentIsolate;

impl FailurePolicy for SilentIsolate {
    fn handle_order_error(&self, _error: &EngineError) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Customer;
    use crate::transport::TransportError;

    fn order_error() -> EngineError {
        EngineError::OrderFetch {
            customer: Customer::new(1, "Josh"),
            source: TransportError::ConnectionClosed,
        }
    }

    #[test]
    fn abort_on_error_stops() {
        assert!(!AbortOnError.handle_order_error(&order_error()));
    }

    #[test]
    fn isolate_errors_continues() {
        assert!(IsolateErrors.handle_order_error(&order_error()));
    }

    #[test]
    fn silent_isolate_continues() {
        assert!(SilentIsolate.handle_order_error(&order_error()));
    }
}
