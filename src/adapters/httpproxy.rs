// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Contour `HTTPProxy` adapter.
//!
//! The hostname is the root proxy's `spec.virtualhost.fqdn`. Contour only
//! writes the Envoy service's external address into
//! `status.loadBalancer.ingress`, so the address always goes through the
//! [`AddressCache`].

use super::{resolve_status_address, string_at, AddressSource, ResourceAdapter, ResourceKind};
use crate::cache::AddressCache;
use kube::api::DynamicObject;
use kube::ResourceExt;
use tracing::debug;

const HTTPPROXY_KIND: ResourceKind = ResourceKind {
    group: "projectcontour.io",
    version: "v1",
    kind: "HTTPProxy",
    resource: "httpproxies",
};

#[derive(Clone, Copy, Debug, Default)]
pub struct HttpProxyAdapter;

impl ResourceAdapter for HttpProxyAdapter {
    fn resource_kind(&self) -> ResourceKind {
        HTTPPROXY_KIND
    }

    fn extract_hostname(&self, obj: &DynamicObject) -> Option<String> {
        let fqdn = string_at(obj, "/spec/virtualhost/fqdn");
        if fqdn.is_none() {
            // Included (non-root) proxies carry no virtualhost
            debug!(
                name = %obj.name_any(),
                namespace = ?obj.namespace(),
                "HTTPProxy has no spec.virtualhost.fqdn"
            );
            crate::metrics::record_extraction_miss(HTTPPROXY_KIND.resource, "hostname");
        }
        fqdn.map(str::to_string)
    }

    fn extract_address(&self, obj: &DynamicObject, cache: &AddressCache) -> Option<String> {
        resolve_status_address(HTTPPROXY_KIND, obj, AddressSource::LoadBalancer, cache)
    }
}

#[cfg(test)]
#[path = "httpproxy_tests.rs"]
mod httpproxy_tests;
