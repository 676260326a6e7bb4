// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resource adapters.
//!
//! A [`ResourceAdapter`] teaches the controller how to read a hostname and an
//! internal address out of one kind of cluster object. Objects are watched as
//! [`DynamicObject`]s so adapters can target third-party CRDs (Contour's
//! `HTTPProxy`) without compiling their types in.
//!
//! Adapters are registered into an explicit list at startup, see
//! [`default_adapters`]. Registration order only affects the order the
//! watchers are started in.
//!
//! # Example
//!
//! ```rust,no_run
//! use dnshortcut::adapters::{HttpProxyAdapter, ResourceAdapter};
//! use dnshortcut::cache::AddressCache;
//! use kube::api::DynamicObject;
//!
//! # fn example(obj: &DynamicObject) {
//! let adapter = HttpProxyAdapter;
//! let mut cache = AddressCache::new();
//! cache.put("203.0.113.10", "10.96.0.15");
//!
//! if let Some(hostname) = adapter.extract_hostname(obj) {
//!     let address = adapter.extract_address(obj, &cache);
//!     println!("{hostname} -> {address:?}");
//! }
//! # }
//! ```

mod httpproxy;
mod ingress;

pub use httpproxy::HttpProxyAdapter;
pub use ingress::IngressAdapter;

use crate::cache::AddressCache;
use crate::errors::ConfigError;
use kube::api::{ApiResource, DynamicObject};
use kube::core::GroupVersionKind;
use kube::ResourceExt;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Identity of a watched resource stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    /// API group, empty for the core group
    pub group: &'static str,
    /// API version
    pub version: &'static str,
    /// Kind, needed to build a dynamic API client
    pub kind: &'static str,
    /// Plural resource name (e.g. `httpproxies`)
    pub resource: &'static str,
}

impl ResourceKind {
    /// Dynamic API descriptor for this resource.
    #[must_use]
    pub fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind {
            group: self.group.to_string(),
            version: self.version.to_string(),
            kind: self.kind.to_string(),
        };
        ApiResource::from_gvk_with_plural(&gvk, self.resource)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.resource)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.resource)
        }
    }
}

/// How an adapter turns the address found in object status into an internal address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressSource {
    /// Status holds the load balancer address; resolve it through the [`AddressCache`]
    #[default]
    LoadBalancer,
    /// Status already holds an internal address
    Direct,
}

impl FromStr for AddressSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "load-balancer" | "loadbalancer" => Ok(AddressSource::LoadBalancer),
            "direct" => Ok(AddressSource::Direct),
            other => Err(ConfigError::UnknownAddressSource(other.to_string())),
        }
    }
}

/// Extraction contract implemented once per watched resource kind.
///
/// Both extraction methods return `None` instead of failing: a missing
/// field or an unknown load balancer address means the object does not
/// (yet) contribute a hostname. They must never hand back an empty string.
pub trait ResourceAdapter: Send + Sync {
    /// Which resource stream this adapter subscribes to.
    fn resource_kind(&self) -> ResourceKind;

    /// Hostname the object wants to be reachable under.
    fn extract_hostname(&self, obj: &DynamicObject) -> Option<String>;

    /// Internal address the hostname should resolve to.
    fn extract_address(&self, obj: &DynamicObject, cache: &AddressCache) -> Option<String>;
}

/// Adapters registered by default.
#[must_use]
pub fn default_adapters() -> Vec<Arc<dyn ResourceAdapter>> {
    vec![Arc::new(HttpProxyAdapter)]
}

/// Non-empty string at a JSON pointer inside the object body.
pub(crate) fn string_at<'a>(obj: &'a DynamicObject, pointer: &str) -> Option<&'a str> {
    obj.data
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// First `status.loadBalancer.ingress` entry's `ip`, falling back to its `hostname`.
pub(crate) fn status_load_balancer_address(obj: &DynamicObject) -> Option<&str> {
    string_at(obj, "/status/loadBalancer/ingress/0/ip")
        .or_else(|| string_at(obj, "/status/loadBalancer/ingress/0/hostname"))
}

/// Apply an [`AddressSource`] to the address found in status.
pub(crate) fn resolve_status_address(
    kind: ResourceKind,
    obj: &DynamicObject,
    source: AddressSource,
    cache: &AddressCache,
) -> Option<String> {
    let Some(status_address) = status_load_balancer_address(obj) else {
        debug!(
            resource = %kind,
            name = %obj.name_any(),
            namespace = ?obj.namespace(),
            "No load balancer address in status"
        );
        crate::metrics::record_extraction_miss(kind.resource, "address");
        return None;
    };

    match source {
        AddressSource::Direct => Some(status_address.to_string()),
        AddressSource::LoadBalancer => {
            if let Some(cluster_ip) = cache.get(status_address) {
                debug!(
                    resource = %kind,
                    name = %obj.name_any(),
                    external_ip = status_address,
                    cluster_ip,
                    "Resolved load balancer address to cluster IP"
                );
                Some(cluster_ip.to_string())
            } else {
                debug!(
                    resource = %kind,
                    name = %obj.name_any(),
                    external_ip = status_address,
                    "No LoadBalancer service seen for address yet"
                );
                crate::metrics::record_extraction_miss(kind.resource, "cache");
                None
            }
        }
    }
}
