//! Kiln operator: reconciles App sources into their child resources
//!
//! The operator polls the API server on a fixed interval, and for each
//! App drives up to three children toward desired state: a Deployment,
//! a Service and an Ingress. Children are created or replaced in full;
//! nothing is ever deleted (cleanup is left to Kubernetes garbage
//! collection via the controller owner reference).

#![deny(missing_docs)]

/// Per-kind capability set: build desired state, compare, carry version
pub mod child;
/// Pure desired-state builders for each child kind
pub mod compiler;
/// Stable identity shared by every child of an App
pub mod identity;
/// Per-App reconcile sequencing and notification
pub mod reconciler;
/// Fixed-interval poll loop
pub mod runner;
/// Store adapters over the Kubernetes API
pub mod store;
