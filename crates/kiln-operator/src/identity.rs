//! Identity and ownership shared by every child of an App
//!
//! The identity is computed once per App per cycle and is immutable
//! afterwards; builders receive it by reference and never mutate it.
//! Every child carries exactly one owner reference with
//! `controller: true` pointing back at the App, which is what lets
//! Kubernetes garbage-collect children when the App is deleted.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};

use kiln_common::crd::App;
use kiln_common::{Error, LABEL_APP, LABEL_MANAGED_BY, MANAGED_BY};

/// Stable identity for the children derived from one App.
#[derive(Clone, Debug)]
pub struct Identity {
    /// Child name (always equal to the App's name)
    pub name: String,
    /// Child namespace (always equal to the App's namespace)
    pub namespace: String,
    uid: String,
    selector: BTreeMap<String, String>,
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
    owner: OwnerReference,
}

impl Identity {
    /// Compute the identity for an App.
    ///
    /// Fails with a validation error when the App has no name,
    /// namespace or uid; such objects cannot produce addressable,
    /// correctly owned children. Every object the server lists carries
    /// all three.
    pub fn for_app(app: &App) -> Result<Self, Error> {
        let name = app
            .meta()
            .name
            .clone()
            .ok_or_else(|| Error::validation("<unnamed>", "source has no name"))?;
        let namespace = app
            .meta()
            .namespace
            .clone()
            .ok_or_else(|| Error::validation(&name, "source has no namespace"))?;
        let uid = app
            .uid()
            .ok_or_else(|| Error::validation(&name, "source has no uid"))?;

        let mut selector = BTreeMap::new();
        selector.insert(LABEL_APP.to_string(), name.clone());

        let mut labels = app.labels().clone();
        labels.insert(LABEL_APP.to_string(), name.clone());
        labels.insert(LABEL_MANAGED_BY.to_string(), MANAGED_BY.to_string());

        let owner = OwnerReference {
            api_version: App::api_version(&()).into_owned(),
            kind: App::kind(&()).into_owned(),
            name: name.clone(),
            uid: uid.clone(),
            controller: Some(true),
            block_owner_deletion: None,
        };

        Ok(Self {
            name,
            namespace,
            uid,
            selector,
            labels,
            annotations: app.annotations().clone(),
            owner,
        })
    }

    /// The one-key selector label set binding children to this App.
    pub fn selector(&self) -> &BTreeMap<String, String> {
        &self.selector
    }

    /// Metadata for a child resource: name and namespace of the App,
    /// the App's labels and annotations, and the controller owner
    /// reference. The version token is left unset; it is only carried
    /// on updates, copied from the most recent fetch.
    pub fn child_meta(&self) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.name.clone()),
            namespace: Some(self.namespace.clone()),
            labels: Some(self.labels.clone()),
            annotations: if self.annotations.is_empty() {
                None
            } else {
                Some(self.annotations.clone())
            },
            owner_references: Some(vec![self.owner.clone()]),
            ..Default::default()
        }
    }

    /// Reference to the App itself, for event emission.
    pub fn object_ref(&self) -> ObjectReference {
        ObjectReference {
            api_version: Some(self.owner.api_version.clone()),
            kind: Some(self.owner.kind.clone()),
            name: Some(self.name.clone()),
            namespace: Some(self.namespace.clone()),
            uid: Some(self.uid.clone()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_common::crd::AppSpec;

    fn sample_app(name: &str, namespace: &str) -> App {
        let mut app = App::new(
            name,
            AppSpec {
                image: "nginx:1".to_string(),
                ..Default::default()
            },
        );
        app.metadata.namespace = Some(namespace.to_string());
        app.metadata.uid = Some("uid-1234".to_string());
        app
    }

    #[test]
    fn identity_uses_app_name_and_namespace() {
        let id = Identity::for_app(&sample_app("web", "prod")).unwrap();
        assert_eq!(id.name, "web");
        assert_eq!(id.namespace, "prod");
    }

    #[test]
    fn selector_is_a_single_app_label() {
        let id = Identity::for_app(&sample_app("web", "prod")).unwrap();
        assert_eq!(id.selector().len(), 1);
        assert_eq!(id.selector().get(LABEL_APP).map(String::as_str), Some("web"));
    }

    #[test]
    fn owner_reference_is_controller_and_matches_app() {
        let id = Identity::for_app(&sample_app("web", "prod")).unwrap();
        let meta = id.child_meta();
        let owners = meta.owner_references.unwrap();
        assert_eq!(owners.len(), 1);
        let owner = &owners[0];
        assert_eq!(owner.controller, Some(true));
        assert_eq!(owner.kind, "App");
        assert_eq!(owner.api_version, "kiln.dev/v1alpha1");
        assert_eq!(owner.name, "web");
        assert_eq!(owner.uid, "uid-1234");
    }

    #[test]
    fn child_meta_carries_app_labels_plus_managed_by() {
        let mut app = sample_app("web", "prod");
        app.metadata
            .labels
            .get_or_insert_with(Default::default)
            .insert("team".to_string(), "platform".to_string());

        let id = Identity::for_app(&app).unwrap();
        let labels = id.child_meta().labels.unwrap();
        assert_eq!(labels.get("team").map(String::as_str), Some("platform"));
        assert_eq!(labels.get(LABEL_APP).map(String::as_str), Some("web"));
        assert_eq!(
            labels.get(LABEL_MANAGED_BY).map(String::as_str),
            Some(MANAGED_BY)
        );
    }

    #[test]
    fn missing_namespace_is_a_validation_error() {
        let mut app = sample_app("web", "prod");
        app.metadata.namespace = None;
        let err = Identity::for_app(&app).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn missing_uid_is_a_validation_error() {
        let mut app = sample_app("web", "prod");
        app.metadata.uid = None;
        let err = Identity::for_app(&app).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("no uid"));
    }

    #[test]
    fn object_ref_points_at_the_app() {
        let id = Identity::for_app(&sample_app("web", "prod")).unwrap();
        let obj_ref = id.object_ref();
        assert_eq!(obj_ref.kind.as_deref(), Some("App"));
        assert_eq!(obj_ref.name.as_deref(), Some("web"));
        assert_eq!(obj_ref.namespace.as_deref(), Some("prod"));
        assert_eq!(obj_ref.uid.as_deref(), Some("uid-1234"));
    }
}
