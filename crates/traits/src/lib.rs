pub mod metrics;

pub use metrics::{ContainerSlot, InMemoryMetricsProvider, MetricsError, MetricsProvider, VariantPayload};
