//! Pure desired-state builders for each child kind
//!
//! Each builder is a deterministic function of the App spec and the
//! precomputed identity: no I/O, no clock reads, no prior state.
//! Re-invoking a builder with identical inputs yields identical output,
//! which is what makes the reconcile loop idempotent.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use kiln_common::crd::AppSpec;

use crate::identity::Identity;

/// Name of the single Service port; the Ingress backend refers to the
/// port by this name rather than by number.
pub const PORT_NAME: &str = "http";

/// Build the desired Deployment: one container named after the App,
/// running its image and command, replicated `replica_count()` times.
pub fn deployment(spec: &AppSpec, id: &Identity) -> Deployment {
    let labels = id.selector().clone();
    Deployment {
        metadata: id.child_meta(),
        spec: Some(DeploymentSpec {
            replicas: Some(spec.replica_count()),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: id.name.clone(),
                        image: Some(spec.image.clone()),
                        command: spec.command.clone(),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

/// Build the desired ClusterIP Service: a single TCP port, listen and
/// target both equal to the App's exposed port, selecting the pods of
/// the matching Deployment.
pub fn service(id: &Identity, port: i32) -> Service {
    Service {
        metadata: id.child_meta(),
        spec: Some(ServiceSpec {
            selector: Some(id.selector().clone()),
            type_: Some("ClusterIP".to_string()),
            ports: Some(vec![ServicePort {
                name: Some(PORT_NAME.to_string()),
                port,
                target_port: Some(IntOrString::Int(port)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

/// Build the desired Ingress: a single rule for the App's host, path
/// `/`, forwarding to the Service by name with the named port.
pub fn ingress(id: &Identity, host: &str) -> Ingress {
    Ingress {
        metadata: id.child_meta(),
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(host.to_string()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/".to_string()),
                        path_type: "Prefix".to_string(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: id.name.clone(),
                                port: Some(ServiceBackendPort {
                                    name: Some(PORT_NAME.to_string()),
                                    number: None,
                                }),
                            }),
                            resource: None,
                        },
                    }],
                }),
            }]),
            ..Default::default()
        }),
        status: None,
    }
}
