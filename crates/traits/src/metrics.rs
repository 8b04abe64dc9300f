//! MetricsProvider trait for abstracting box-model measurement.
//!
//! The pagination core never computes margins, borders, padding or rendered
//! heights itself. A provider supplies them, either from a real layout
//! engine or from pre-computed numbers.

use folio_types::{BoxMetrics, SourceElement};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;
use thiserror::Error;

/// Error type for measurement operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("No metrics available for element: {0}")]
    NotFound(String),

    #[error("Element '{element}' could not be measured: {message}")]
    Unmeasurable { element: String, message: String },

    #[error("Metrics store lock poisoned")]
    LockPoisoned,
}

/// Identifies one figure container on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerSlot {
    pub page: u32,
    pub container: usize,
}

impl ContainerSlot {
    pub fn new(page: u32, container: usize) -> Self {
        Self { page, container }
    }
}

/// The size variant a container is switched to.
#[derive(Debug, Clone, Copy)]
pub struct VariantPayload<'a> {
    pub size_name: &'a str,
    pub markup: &'a str,
    pub min_width: f32,
    pub min_height: f32,
}

/// A trait for resolving box metrics and rendering figure size variants.
///
/// # Implementations
///
/// - `InMemoryMetricsProvider`: serves pre-computed metrics (always available)
pub trait MetricsProvider: Send + Sync + Debug {
    /// Resolve the box metrics of a content element.
    ///
    /// Called once per element while the content tree is built.
    fn measure(&self, element: &SourceElement) -> Result<BoxMetrics, MetricsError>;

    /// Switch a container to display the given size variant.
    ///
    /// # Returns
    ///
    /// The rendered height of the container with the variant applied.
    fn apply_size_variant(
        &self,
        slot: ContainerSlot,
        variant: &VariantPayload<'_>,
    ) -> Result<f32, MetricsError>;

    /// Undo a previous `apply_size_variant` on the same slot.
    fn revert_size_variant(&self, slot: ContainerSlot, size_name: &str)
    -> Result<(), MetricsError>;

    /// Returns a human-readable name for this provider (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// An in-memory metrics provider.
///
/// Elements carrying inline metrics are measured directly; others are looked
/// up by id. Rendered heights of figure payloads are registered by markup and
/// default to the variant's declared minimum height.
#[derive(Debug, Default)]
pub struct InMemoryMetricsProvider {
    metrics: RwLock<HashMap<String, BoxMetrics>>,
    rendered: RwLock<HashMap<String, f32>>,
    applied: RwLock<HashMap<ContainerSlot, String>>,
}

impl InMemoryMetricsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metrics for the element with the given id.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::LockPoisoned` if the internal lock is poisoned.
    pub fn add_metrics(&self, id: impl Into<String>, metrics: BoxMetrics) -> Result<(), MetricsError> {
        let mut store = self.metrics.write().map_err(|_| MetricsError::LockPoisoned)?;
        store.insert(id.into(), metrics);
        Ok(())
    }

    /// Register the height a payload renders at when placed in a container.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::LockPoisoned` if the internal lock is poisoned.
    pub fn add_rendered_height(&self, markup: impl Into<String>, height: f32) -> Result<(), MetricsError> {
        let mut store = self.rendered.write().map_err(|_| MetricsError::LockPoisoned)?;
        store.insert(markup.into(), height);
        Ok(())
    }

    /// The size name currently applied to a slot, if any.
    pub fn applied_variant(&self, slot: ContainerSlot) -> Option<String> {
        self.applied.read().ok()?.get(&slot).cloned()
    }

    /// Number of registered element metrics.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.metrics.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the lock is poisoned (safe default).
    pub fn is_empty(&self) -> bool {
        self.metrics.read().map(|m| m.is_empty()).unwrap_or(true)
    }

    /// Clear all registered metrics, heights and applied variants.
    pub fn clear(&self) {
        if let Ok(mut m) = self.metrics.write() {
            m.clear();
        }
        if let Ok(mut r) = self.rendered.write() {
            r.clear();
        }
        if let Ok(mut a) = self.applied.write() {
            a.clear();
        }
    }
}

impl MetricsProvider for InMemoryMetricsProvider {
    fn measure(&self, element: &SourceElement) -> Result<BoxMetrics, MetricsError> {
        if let Some(metrics) = element.metrics {
            return Ok(metrics);
        }
        let id = element
            .id
            .as_deref()
            .ok_or_else(|| MetricsError::NotFound(format!("<{}> without id", element.tag_name())))?;
        let store = self.metrics.read().map_err(|_| MetricsError::LockPoisoned)?;
        store
            .get(id)
            .copied()
            .ok_or_else(|| MetricsError::NotFound(id.to_string()))
    }

    fn apply_size_variant(
        &self,
        slot: ContainerSlot,
        variant: &VariantPayload<'_>,
    ) -> Result<f32, MetricsError> {
        let height = {
            let rendered = self.rendered.read().map_err(|_| MetricsError::LockPoisoned)?;
            rendered
                .get(variant.markup)
                .copied()
                .unwrap_or(variant.min_height)
        };
        let mut applied = self.applied.write().map_err(|_| MetricsError::LockPoisoned)?;
        applied.insert(slot, variant.size_name.to_string());
        Ok(height)
    }

    fn revert_size_variant(
        &self,
        slot: ContainerSlot,
        size_name: &str,
    ) -> Result<(), MetricsError> {
        let mut applied = self.applied.write().map_err(|_| MetricsError::LockPoisoned)?;
        if applied.get(&slot).is_some_and(|name| name == size_name) {
            applied.remove(&slot);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "InMemoryMetricsProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant<'a>(name: &'a str, markup: &'a str, min_height: f32) -> VariantPayload<'a> {
        VariantPayload {
            size_name: name,
            markup,
            min_width: 0.0,
            min_height,
        }
    }

    #[test]
    fn test_inline_metrics_take_precedence() {
        let provider = InMemoryMetricsProvider::new();
        provider
            .add_metrics("p1", BoxMetrics::with_height(100.0, 20.0))
            .unwrap();
        let el = SourceElement::new("p")
            .with_id("p1")
            .with_metrics(BoxMetrics::with_height(40.0, 20.0));

        let m = provider.measure(&el).unwrap();
        assert_eq!(m.outer_h, 40.0);
    }

    #[test]
    fn test_measure_by_id() {
        let provider = InMemoryMetricsProvider::new();
        provider
            .add_metrics("p1", BoxMetrics::with_height(100.0, 20.0))
            .unwrap();
        let m = provider.measure(&SourceElement::new("p").with_id("p1")).unwrap();
        assert_eq!(m.outer_h, 100.0);
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_measure_not_found() {
        let provider = InMemoryMetricsProvider::new();
        let result = provider.measure(&SourceElement::new("p").with_id("missing"));
        assert!(matches!(result, Err(MetricsError::NotFound(_))));

        let result = provider.measure(&SourceElement::new("p"));
        assert!(matches!(result, Err(MetricsError::NotFound(_))));
    }

    #[test]
    fn test_apply_defaults_to_min_height() {
        let provider = InMemoryMetricsProvider::new();
        let slot = ContainerSlot::new(0, 1);
        let h = provider
            .apply_size_variant(slot, &variant("small", "<img>", 120.0))
            .unwrap();
        assert_eq!(h, 120.0);
        assert_eq!(provider.applied_variant(slot).as_deref(), Some("small"));
    }

    #[test]
    fn test_apply_uses_registered_height() {
        let provider = InMemoryMetricsProvider::new();
        provider.add_rendered_height("<img>", 310.0).unwrap();
        let h = provider
            .apply_size_variant(ContainerSlot::new(2, 0), &variant("large", "<img>", 0.0))
            .unwrap();
        assert_eq!(h, 310.0);
    }

    #[test]
    fn test_revert_clears_matching_variant_only() {
        let provider = InMemoryMetricsProvider::new();
        let slot = ContainerSlot::new(0, 0);
        provider
            .apply_size_variant(slot, &variant("large", "<img>", 10.0))
            .unwrap();

        provider.revert_size_variant(slot, "small").unwrap();
        assert_eq!(provider.applied_variant(slot).as_deref(), Some("large"));

        provider.revert_size_variant(slot, "large").unwrap();
        assert!(provider.applied_variant(slot).is_none());
    }

    #[test]
    fn test_clear() {
        let provider = InMemoryMetricsProvider::new();
        provider.add_metrics("a", BoxMetrics::default()).unwrap();
        provider.add_metrics("b", BoxMetrics::default()).unwrap();
        assert_eq!(provider.len(), 2);
        provider.clear();
        assert!(provider.is_empty());
    }

    #[test]
    fn test_provider_name() {
        let provider = InMemoryMetricsProvider::new();
        assert_eq!(provider.name(), "InMemoryMetricsProvider");
    }

    #[test]
    fn test_metrics_error_display() {
        let err = MetricsError::NotFound("intro".to_string());
        assert!(err.to_string().contains("intro"));

        let err = MetricsError::Unmeasurable {
            element: "video".to_string(),
            message: "not rendered".to_string(),
        };
        assert!(err.to_string().contains("video"));
        assert!(err.to_string().contains("not rendered"));
    }
}
