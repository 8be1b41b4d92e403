//! Kubernetes Event publishing for the kiln reconciler.
//!
//! Provides a trait-based abstraction over `kube::runtime::events::Recorder`
//! so the reconciler can emit standard Kubernetes Events visible via
//! `kubectl describe app` and `kubectl get events`.
//!
//! Events are **fire-and-forget**: failures are logged as warnings and
//! counted in [`crate::metrics::EVENT_PUBLISH_FAILURES`], never
//! propagated. A failed event must never break reconciliation.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

use crate::metrics;

/// Reason codes carried on reconcile Events.
///
/// The vocabulary is fixed: `MissingImage` plus `{Kind}Created`,
/// `{Kind}Updated` and `{Kind}Failed` per child kind.
pub mod reason {
    /// The App names no image and produced no children.
    pub const MISSING_IMAGE: &str = "MissingImage";

    /// Reason for a newly created child of the given kind.
    pub fn created(kind: &str) -> String {
        format!("{kind}Created")
    }

    /// Reason for an updated child of the given kind.
    pub fn updated(kind: &str) -> String {
        format!("{kind}Updated")
    }

    /// Reason for a failed reconcile of the given kind.
    pub fn failed(kind: &str) -> String {
        format!("{kind}Failed")
    }
}

/// Trait for publishing Kubernetes Events.
///
/// Implementations are expected to be fire-and-forget: `publish()` logs
/// a warning on failure but never returns an error.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an Event on the given App.
    ///
    /// # Arguments
    ///
    /// * `app_ref` - The App this event is about
    /// * `type_` - Normal or Warning
    /// * `reason` - Machine-readable reason (see [`reason`])
    /// * `message` - Human-readable message
    async fn publish(
        &self,
        app_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        message: String,
    );
}

/// Production implementation wrapping `kube::runtime::events::Recorder`.
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    /// Create a new publisher for the given controller name.
    ///
    /// The controller name appears as the "reportingComponent" on
    /// Events (e.g. "kiln-operator").
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: None,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        app_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        message: String,
    ) {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note: Some(message),
            action: "Reconcile".to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, app_ref).await {
            metrics::EVENT_PUBLISH_FAILURES.add(1, &[]);
            warn!(
                reason,
                error = %e,
                "failed to publish Kubernetes event"
            );
        }
    }
}

/// No-op implementation for tests.
///
/// All calls are silently ignored; no Kubernetes API interaction.
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(
        &self,
        _app_ref: &ObjectReference,
        _type_: EventType,
        _reason: &str,
        _message: String,
    ) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_vocabulary_is_kind_scoped() {
        assert_eq!(reason::created("Deployment"), "DeploymentCreated");
        assert_eq!(reason::updated("Service"), "ServiceUpdated");
        assert_eq!(reason::failed("Ingress"), "IngressFailed");
        assert_eq!(reason::MISSING_IMAGE, "MissingImage");
    }

    #[tokio::test]
    async fn noop_publisher_ignores_events() {
        let publisher = NoopEventPublisher;
        publisher
            .publish(
                &ObjectReference::default(),
                EventType::Normal,
                "DeploymentCreated",
                "created deployment".to_string(),
            )
            .await;
    }
}
