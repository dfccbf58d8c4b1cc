use prometheus_client::metrics::{
    counter::Counter, family::Family, gauge::Gauge, histogram::Histogram,
};
use prometheus_client::registry::Registry;
use prometheus_client_derive_encode::{EncodeLabelSet, EncodeLabelValue};

use crate::circuit_breaker::CircuitState;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Outcome {
    Success,
    Failure,
    Released,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: Outcome,
}

#[derive(Clone, Debug)]
pub struct ProcessorMetrics {
    pub messages_received: Counter,
    pub messages: Family<OutcomeLabels, Counter>,
    pub processing_duration: Histogram,
    pub circuit_breaker_state: Gauge,
    pub circuit_breaker_trips: Counter,
}

impl Default for ProcessorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessorMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: Counter::default(),
            messages: Family::default(),
            processing_duration: Histogram::new(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
            circuit_breaker_state: Gauge::default(),
            circuit_breaker_trips: Counter::default(),
        }
    }

    pub fn register(&self, registry: &mut Registry) {
        let registry = registry.sub_registry_with_prefix("order_processor");

        registry.register(
            "messages_received",
            "Messages handed out by the queue",
            self.messages_received.clone(),
        );
        registry.register(
            "messages",
            "Processed messages by outcome",
            self.messages.clone(),
        );
        registry.register(
            "processing_duration_seconds",
            "Time spent processing one message",
            self.processing_duration.clone(),
        );
        registry.register(
            "circuit_breaker_state",
            "Circuit breaker state (0 closed, 1 half-open, 2 open)",
            self.circuit_breaker_state.clone(),
        );
        registry.register(
            "circuit_breaker_trips",
            "Times the circuit breaker opened",
            self.circuit_breaker_trips.clone(),
        );
    }

    pub fn record(&self, outcome: Outcome) {
        self.messages.get_or_create(&OutcomeLabels { outcome }).inc();
    }

    pub fn outcome_count(&self, outcome: Outcome) -> u64 {
        self.messages.get_or_create(&OutcomeLabels { outcome }).get()
    }

    pub fn set_breaker_state(&self, state: CircuitState) {
        self.circuit_breaker_state.set(state.as_gauge());
    }
}
