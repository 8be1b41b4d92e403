//! App Custom Resource Definition
//!
//! An `App` is a small declarative description of a workload: an image
//! to run, an optional exposed port and an optional ingress hostname.
//! The operator derives up to three children from each App: a
//! Deployment (always, when the image is set), a Service (when a port
//! is exposed) and an Ingress (when a host is also set).

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Specification of an App
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "kiln.dev",
    version = "v1alpha1",
    kind = "App",
    namespaced,
    shortname = "app"
)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    /// Hostname for the Ingress. If empty, no Ingress is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Image to run. Required; an App with an empty image produces no
    /// children, only a MissingImage event.
    pub image: String,

    /// Command to run. Optional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    /// Replica count. Defaults to 1 when absent or zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Port exposed by the container. If absent or zero, no Service or
    /// Ingress is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

impl AppSpec {
    /// Effective replica count: absent or zero means 1.
    pub fn replica_count(&self) -> i32 {
        match self.replicas {
            Some(n) if n > 0 => n,
            _ => 1,
        }
    }

    /// The exposed port, if network exposure was requested.
    pub fn exposed_port(&self) -> Option<i32> {
        match self.port {
            Some(p) if p > 0 => Some(p),
            _ => None,
        }
    }

    /// The ingress hostname, if one was requested.
    pub fn ingress_host(&self) -> Option<&str> {
        self.host.as_deref().filter(|h| !h.is_empty())
    }

    /// Whether the spec names an image at all.
    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }
}
