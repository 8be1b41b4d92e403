//! Shared types for the kiln operator
//!
//! Kiln reconciles `App` sources into Deployment, Service and Ingress
//! children. This crate holds what both the operator binary and tests
//! need: the CRD definition, the error type, event publishing and the
//! metrics registry.

#![deny(missing_docs)]

/// App custom resource definition
pub mod crd;
/// Structured error type for store and reconcile operations
pub mod error;
/// Fire-and-forget Kubernetes Event publishing
pub mod events;
/// OpenTelemetry metrics registry
pub mod metrics;

pub use error::Error;

/// Label key binding a child resource to the App that owns it.
///
/// Applied identically to the Deployment selector, the Deployment pod
/// template and the Service selector so the Service always targets
/// exactly the pods of the matching Deployment.
pub const LABEL_APP: &str = "app.kiln.dev/name";

/// Standard managed-by label key.
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of [`LABEL_MANAGED_BY`] on every child kiln creates.
pub const MANAGED_BY: &str = "kiln";

/// Result alias using the kiln [`Error`] type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
