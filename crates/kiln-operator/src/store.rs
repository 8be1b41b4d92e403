//! Store adapters over the Kubernetes API
//!
//! The traits here are the seam between the reconciler and the API
//! server, and what the tests mock. `KubeStore` implements
//! [`ChildStore`] once, generically, for any namespaced resource: one
//! driver instead of three near-identical ones.
//!
//! Adapters never retry; a failed call surfaces as an error and the
//! next poll cycle retries implicitly. Every call is bounded by an
//! explicit per-call timeout so one stuck request cannot stall the
//! sequential loop indefinitely.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, PostParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[cfg(test)]
use mockall::automock;

use kiln_common::crd::App;
use kiln_common::Error;

/// Fetch/create/update operations for one child kind.
///
/// `fetch` maps "not found" to `Ok(None)`: a missing child is a normal
/// result, not an error. `create` issues a POST and `update` a full
/// PUT replace; the updated object must carry the version token from
/// the most recent fetch.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChildStore<K: Send + Sync + 'static>: Send + Sync {
    /// Get the child, or `None` if the store reports not-found.
    async fn fetch(&self, namespace: &str, name: &str) -> Result<Option<K>, Error>;

    /// Create the child. The request body carries no version token.
    async fn create(&self, namespace: &str, child: &K) -> Result<(), Error>;

    /// Replace the child in full, including the carried version token.
    async fn update(&self, namespace: &str, name: &str, child: &K) -> Result<(), Error>;
}

/// Listing of App sources, in the order the store returns them.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AppStore: Send + Sync {
    /// List all Apps across namespaces.
    async fn list_apps(&self) -> Result<Vec<App>, Error>;
}

/// Production store backed by a `kube::Client`.
pub struct KubeStore {
    client: Client,
    call_timeout: Duration,
}

impl KubeStore {
    /// Create a store with the given per-call timeout.
    pub fn new(client: Client, call_timeout: Duration) -> Self {
        Self {
            client,
            call_timeout,
        }
    }
}

#[async_trait]
impl<K> ChildStore<K> for KubeStore
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync
        + 'static,
{
    async fn fetch(&self, namespace: &str, name: &str) -> Result<Option<K>, Error> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let kind = K::kind(&()).into_owned();
        match tokio::time::timeout(self.call_timeout, api.get(name)).await {
            Ok(Ok(child)) => Ok(Some(child)),
            Ok(Err(kube::Error::Api(ae))) if ae.code == 404 => Ok(None),
            Ok(Err(e)) => Err(Error::store("get", kind, e)),
            Err(_) => Err(Error::timeout("get", kind, self.call_timeout)),
        }
    }

    async fn create(&self, namespace: &str, child: &K) -> Result<(), Error> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let kind = K::kind(&()).into_owned();
        match tokio::time::timeout(self.call_timeout, api.create(&PostParams::default(), child))
            .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Error::store("create", kind, e)),
            Err(_) => Err(Error::timeout("create", kind, self.call_timeout)),
        }
    }

    async fn update(&self, namespace: &str, name: &str, child: &K) -> Result<(), Error> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let kind = K::kind(&()).into_owned();
        match tokio::time::timeout(
            self.call_timeout,
            api.replace(name, &PostParams::default(), child),
        )
        .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Error::store("update", kind, e)),
            Err(_) => Err(Error::timeout("update", kind, self.call_timeout)),
        }
    }
}

#[async_trait]
impl AppStore for KubeStore {
    async fn list_apps(&self) -> Result<Vec<App>, Error> {
        let api: Api<App> = Api::all(self.client.clone());
        match tokio::time::timeout(self.call_timeout, api.list(&Default::default())).await {
            Ok(Ok(list)) => Ok(list.items),
            Ok(Err(e)) => Err(Error::store("list", "App", e)),
            Err(_) => Err(Error::timeout("list", "App", self.call_timeout)),
        }
    }
}
