//! Fixed-interval poll loop
//!
//! The operator polls rather than watches: every tick lists all Apps
//! and reconciles them sequentially. The first tick fires immediately,
//! so one full pass runs at startup before the interval starts gating.
//! A failed listing skips the cycle; the next tick retries.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::reconciler::Reconciler;
use crate::store::AppStore;

/// Run reconcile cycles forever at the given interval.
pub async fn run(reconciler: Arc<Reconciler>, apps: Arc<dyn AppStore>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs(), "starting poll loop");
    loop {
        ticker.tick().await;
        run_cycle(&reconciler, apps.as_ref()).await;
    }
}

/// One cycle: list every App, then reconcile the listing.
pub async fn run_cycle(reconciler: &Reconciler, apps: &dyn AppStore) {
    match apps.list_apps().await {
        Ok(list) => reconciler.reconcile_all(&list).await,
        Err(e) => warn!(error = %e, "failed to list sources, skipping cycle"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::Service;
    use k8s_openapi::api::networking::v1::Ingress;

    use kiln_common::crd::{App, AppSpec};
    use kiln_common::events::NoopEventPublisher;
    use kiln_common::Error;

    use crate::store::{MockAppStore, MockChildStore};

    fn reconciler_with(deployments: MockChildStore<Deployment>) -> Reconciler {
        Reconciler::new(
            Arc::new(deployments),
            Arc::new(MockChildStore::<Service>::new()),
            Arc::new(MockChildStore::<Ingress>::new()),
            Arc::new(NoopEventPublisher),
        )
    }

    #[tokio::test]
    async fn failed_listing_skips_the_cycle() {
        let mut apps = MockAppStore::new();
        apps.expect_list_apps()
            .times(1)
            .returning(|| Err(Error::transport("list", "App", "connection refused")));

        // child stores have zero expectations: any call panics
        let reconciler = reconciler_with(MockChildStore::new());
        run_cycle(&reconciler, &apps).await;
    }

    #[tokio::test]
    async fn listed_apps_are_reconciled() {
        let mut app = App::new(
            "web",
            AppSpec {
                image: "nginx:1".to_string(),
                ..Default::default()
            },
        );
        app.metadata.namespace = Some("default".to_string());
        app.metadata.uid = Some("uid-1".to_string());

        let mut apps = MockAppStore::new();
        apps.expect_list_apps()
            .times(1)
            .returning(move || Ok(vec![app.clone()]));

        let mut deployments = MockChildStore::new();
        deployments
            .expect_fetch()
            .times(1)
            .returning(|_, _| Ok(None));
        deployments
            .expect_create()
            .times(1)
            .returning(|_, _| Ok(()));

        let reconciler = reconciler_with(deployments);
        run_cycle(&reconciler, &apps).await;
    }
}
