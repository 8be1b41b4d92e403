//! Per-kind capability set for the generic reconcile routine
//!
//! The reconciler runs one generic ensure flow; everything that differs
//! between child kinds lives behind this trait: how to build the
//! desired object (including whether the App requests the kind at all),
//! how to compare specs, and how to carry the version token forward on
//! an update.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;

use kiln_common::crd::AppSpec;

use crate::compiler;
use crate::identity::Identity;

/// A child resource kind the operator can derive from an App.
pub trait ChildResource: Clone + std::fmt::Debug + Send + Sync + Sized + 'static {
    /// Kind name used in event reasons, logs and error context.
    const KIND: &'static str;

    /// Build the desired object, or `None` when the App does not
    /// request this kind (no exposed port, no host).
    fn desired(spec: &AppSpec, id: &Identity) -> Option<Self>;

    /// Structural equality of the spec substructure only. Identity,
    /// annotations and the version token never participate, so
    /// metadata-only drift never triggers an update.
    fn specs_match(&self, other: &Self) -> bool;

    /// Copy the observed version token into this (desired) object so a
    /// full-replace update does not blindly overwrite a newer revision.
    fn carry_version_from(&mut self, observed: &Self);
}

impl ChildResource for Deployment {
    const KIND: &'static str = "Deployment";

    fn desired(spec: &AppSpec, id: &Identity) -> Option<Self> {
        Some(compiler::deployment(spec, id))
    }

    fn specs_match(&self, other: &Self) -> bool {
        self.spec == other.spec
    }

    fn carry_version_from(&mut self, observed: &Self) {
        self.metadata.resource_version = observed.metadata.resource_version.clone();
    }
}

impl ChildResource for Service {
    const KIND: &'static str = "Service";

    fn desired(spec: &AppSpec, id: &Identity) -> Option<Self> {
        spec.exposed_port().map(|port| compiler::service(id, port))
    }

    fn specs_match(&self, other: &Self) -> bool {
        self.spec == other.spec
    }

    fn carry_version_from(&mut self, observed: &Self) {
        self.metadata.resource_version = observed.metadata.resource_version.clone();
    }
}

impl ChildResource for Ingress {
    const KIND: &'static str = "Ingress";

    /// An Ingress requires both an exposed port and a host: a host with
    /// no port still routes nowhere, so the port gate applies here too.
    fn desired(spec: &AppSpec, id: &Identity) -> Option<Self> {
        spec.exposed_port()?;
        spec.ingress_host().map(|host| compiler::ingress(id, host))
    }

    fn specs_match(&self, other: &Self) -> bool {
        self.spec == other.spec
    }

    fn carry_version_from(&mut self, observed: &Self) {
        self.metadata.resource_version = observed.metadata.resource_version.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_common::crd::App;

    fn identity(spec: &AppSpec) -> Identity {
        let mut app = App::new("web", spec.clone());
        app.metadata.namespace = Some("default".to_string());
        app.metadata.uid = Some("uid-1".to_string());
        Identity::for_app(&app).unwrap()
    }

    fn exposed_spec() -> AppSpec {
        AppSpec {
            image: "nginx:1".to_string(),
            port: Some(80),
            host: Some("web.example.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn service_and_ingress_gate_on_port() {
        let spec = AppSpec {
            image: "nginx:1".to_string(),
            port: Some(0),
            host: Some("web.example.com".to_string()),
            ..Default::default()
        };
        let id = identity(&spec);

        assert!(Deployment::desired(&spec, &id).is_some());
        assert!(Service::desired(&spec, &id).is_none());
        // host is set but the port gate still applies
        assert!(Ingress::desired(&spec, &id).is_none());
    }

    #[test]
    fn ingress_gates_on_host() {
        let spec = AppSpec {
            host: None,
            ..exposed_spec()
        };
        let id = identity(&spec);

        assert!(Service::desired(&spec, &id).is_some());
        assert!(Ingress::desired(&spec, &id).is_none());
    }

    #[test]
    fn specs_match_ignores_metadata() {
        let spec = exposed_spec();
        let id = identity(&spec);

        let desired = Deployment::desired(&spec, &id).unwrap();
        let mut observed = desired.clone();
        observed.metadata.resource_version = Some("42".to_string());
        observed.metadata.annotations =
            Some([("noise".to_string(), "1".to_string())].into_iter().collect());

        assert!(desired.specs_match(&observed));
    }

    #[test]
    fn specs_match_detects_spec_drift() {
        let spec = exposed_spec();
        let id = identity(&spec);

        let desired = Deployment::desired(&spec, &id).unwrap();
        let mut observed = desired.clone();
        if let Some(ref mut dspec) = observed.spec {
            dspec.replicas = Some(5);
        }

        assert!(!desired.specs_match(&observed));
    }

    #[test]
    fn carry_version_copies_the_observed_token() {
        let spec = exposed_spec();
        let id = identity(&spec);

        let mut desired = Service::desired(&spec, &id).unwrap();
        let mut observed = desired.clone();
        observed.metadata.resource_version = Some("7".to_string());

        desired.carry_version_from(&observed);
        assert_eq!(desired.metadata.resource_version.as_deref(), Some("7"));
    }
}
