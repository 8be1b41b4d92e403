//! Per-App reconcile sequencing
//!
//! One cycle processes each App independently, and within an App each
//! child kind independently in a fixed order: Deployment, then Service,
//! then Ingress. A failure at one kind aborts the later kinds for that
//! App only; every other App still reconciles. Errors never escape a
//! cycle — they become Warning events and a log line.
//!
//! The ensure flow itself is generic: fetch current, build desired,
//! compare specs, create or replace. Everything kind-specific lives in
//! [`ChildResource`].

use std::sync::Arc;
use std::time::Instant;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::events::EventType;
use kube::ResourceExt;
use opentelemetry::KeyValue;
use tracing::{debug, info, instrument, warn};

use kiln_common::crd::{App, AppSpec};
use kiln_common::events::{reason, EventPublisher};
use kiln_common::{metrics, Error};

use crate::child::ChildResource;
use crate::identity::Identity;
use crate::store::ChildStore;

/// What one ensure pass did for one (App, kind) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The child did not exist and was created.
    Created,
    /// The child existed with a different spec and was replaced.
    Updated,
    /// The child existed and already matched the desired spec.
    Unchanged,
    /// The App does not request this child kind.
    Skipped,
}

/// Drive one child kind toward desired state.
///
/// Fetch the current object; if absent, create the desired one; if
/// present and the specs match, do nothing; otherwise carry the
/// observed version token into the desired object and replace it.
pub async fn ensure<K: ChildResource>(
    store: &dyn ChildStore<K>,
    spec: &AppSpec,
    id: &Identity,
) -> Result<Outcome, Error> {
    let Some(mut desired) = K::desired(spec, id) else {
        return Ok(Outcome::Skipped);
    };

    match store.fetch(&id.namespace, &id.name).await? {
        None => {
            store.create(&id.namespace, &desired).await?;
            metrics::CHILD_WRITES.add(
                1,
                &[
                    KeyValue::new("kind", K::KIND),
                    KeyValue::new("action", "create"),
                ],
            );
            Ok(Outcome::Created)
        }
        Some(observed) => {
            if desired.specs_match(&observed) {
                return Ok(Outcome::Unchanged);
            }
            desired.carry_version_from(&observed);
            store.update(&id.namespace, &id.name, &desired).await?;
            metrics::CHILD_WRITES.add(
                1,
                &[
                    KeyValue::new("kind", K::KIND),
                    KeyValue::new("action", "update"),
                ],
            );
            Ok(Outcome::Updated)
        }
    }
}

/// Reconciles App sources against their child resources.
pub struct Reconciler {
    deployments: Arc<dyn ChildStore<Deployment>>,
    services: Arc<dyn ChildStore<Service>>,
    ingresses: Arc<dyn ChildStore<Ingress>>,
    events: Arc<dyn EventPublisher>,
}

impl Reconciler {
    /// Create a reconciler over the given stores and event sink.
    pub fn new(
        deployments: Arc<dyn ChildStore<Deployment>>,
        services: Arc<dyn ChildStore<Service>>,
        ingresses: Arc<dyn ChildStore<Ingress>>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            deployments,
            services,
            ingresses,
            events,
        }
    }

    /// Process one cycle's worth of Apps, strictly sequentially, in
    /// the order the lister returned them.
    pub async fn reconcile_all(&self, apps: &[App]) {
        let started = Instant::now();
        for app in apps {
            self.reconcile_app(app).await;
        }
        let elapsed = started.elapsed();
        metrics::RECONCILE_DURATION.record(elapsed.as_secs_f64(), &[]);
        info!(
            apps = apps.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "reconcile cycle complete"
        );
    }

    /// Reconcile a single App.
    ///
    /// Never returns an error: failures are converted into Warning
    /// events and abort only the remaining kinds of this App.
    #[instrument(skip_all, fields(
        app = %app.name_any(),
        namespace = %app.namespace().unwrap_or_default(),
    ))]
    pub async fn reconcile_app(&self, app: &App) {
        let id = match Identity::for_app(app) {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "skipping malformed source");
                return;
            }
        };

        if !app.spec.has_image() {
            warn!("source names no image");
            self.events
                .publish(
                    &id.object_ref(),
                    EventType::Warning,
                    reason::MISSING_IMAGE,
                    "no image specified".to_string(),
                )
                .await;
            return;
        }

        if !self.step(self.deployments.as_ref(), app, &id).await {
            return;
        }
        if !self.step(self.services.as_ref(), app, &id).await {
            return;
        }
        self.step(self.ingresses.as_ref(), app, &id).await;
    }

    /// Ensure one kind and report the transition. Returns false when
    /// the remaining kinds for this App should be aborted.
    async fn step<K: ChildResource>(
        &self,
        store: &dyn ChildStore<K>,
        app: &App,
        id: &Identity,
    ) -> bool {
        match ensure(store, &app.spec, id).await {
            Ok(Outcome::Created) => {
                info!(kind = K::KIND, "created child");
                self.events
                    .publish(
                        &id.object_ref(),
                        EventType::Normal,
                        &reason::created(K::KIND),
                        format!("created {}", K::KIND),
                    )
                    .await;
                true
            }
            Ok(Outcome::Updated) => {
                info!(kind = K::KIND, "updated child");
                self.events
                    .publish(
                        &id.object_ref(),
                        EventType::Normal,
                        &reason::updated(K::KIND),
                        format!("updated {}", K::KIND),
                    )
                    .await;
                true
            }
            Ok(Outcome::Unchanged) => {
                debug!(kind = K::KIND, "child up to date");
                true
            }
            Ok(Outcome::Skipped) => {
                debug!(kind = K::KIND, "child not requested");
                true
            }
            Err(e) => {
                warn!(kind = K::KIND, error = %e, "failed to reconcile child");
                metrics::RECONCILE_FAILURES.add(1, &[KeyValue::new("kind", K::KIND)]);
                self.events
                    .publish(
                        &id.object_ref(),
                        EventType::Warning,
                        &reason::failed(K::KIND),
                        e.to_string(),
                    )
                    .await;
                false
            }
        }
    }
}
