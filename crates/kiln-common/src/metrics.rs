//! Metrics registry for kiln observability
//!
//! Provides OpenTelemetry metrics for:
//! - Reconcile cycles (duration)
//! - Child resource writes (creates/updates per kind)
//! - Per-kind reconcile failures
//! - Event publishing failures (events are fire-and-forget; this
//!   counter is the only place a lost notification shows up)

use once_cell::sync::Lazy;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Global meter for kiln metrics
static METER: Lazy<Meter> = Lazy::new(|| global::meter("kiln"));

/// Histogram of full reconcile cycle duration
pub static RECONCILE_DURATION: Lazy<Histogram<f64>> = Lazy::new(|| {
    METER
        .f64_histogram("kiln_reconcile_duration_seconds")
        .with_description("Duration of a full reconcile cycle in seconds")
        .with_unit("s")
        .build()
});

/// Counter of child resource writes
///
/// Labels:
/// - `kind`: Deployment, Service, Ingress
/// - `action`: create, update
pub static CHILD_WRITES: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("kiln_child_writes_total")
        .with_description("Total number of child resources created or updated")
        .with_unit("{writes}")
        .build()
});

/// Counter of per-kind reconcile failures
///
/// Labels:
/// - `kind`: Deployment, Service, Ingress
pub static RECONCILE_FAILURES: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("kiln_reconcile_failures_total")
        .with_description("Total number of failed child reconcile attempts")
        .with_unit("{errors}")
        .build()
});

/// Counter of Kubernetes Events that failed to publish
pub static EVENT_PUBLISH_FAILURES: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("kiln_event_publish_failures_total")
        .with_description("Total number of Events that could not be published")
        .with_unit("{errors}")
        .build()
});
