// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `networking.k8s.io/v1` `Ingress` adapter.
//!
//! Uses the first rule's host. Whether the status address is the external
//! load balancer address or already a cluster IP depends on how the ingress
//! controller publishes status, hence the configurable [`AddressSource`].

use super::{resolve_status_address, string_at, AddressSource, ResourceAdapter, ResourceKind};
use crate::cache::AddressCache;
use kube::api::DynamicObject;
use kube::ResourceExt;
use tracing::debug;

const INGRESS_KIND: ResourceKind = ResourceKind {
    group: "networking.k8s.io",
    version: "v1",
    kind: "Ingress",
    resource: "ingresses",
};

#[derive(Clone, Copy, Debug, Default)]
pub struct IngressAdapter {
    address_source: AddressSource,
}

impl IngressAdapter {
    #[must_use]
    pub fn new(address_source: AddressSource) -> Self {
        Self { address_source }
    }
}

impl ResourceAdapter for IngressAdapter {
    fn resource_kind(&self) -> ResourceKind {
        INGRESS_KIND
    }

    fn extract_hostname(&self, obj: &DynamicObject) -> Option<String> {
        let host = string_at(obj, "/spec/rules/0/host");
        if host.is_none() {
            debug!(
                name = %obj.name_any(),
                namespace = ?obj.namespace(),
                "Ingress has no spec.rules[0].host"
            );
            crate::metrics::record_extraction_miss(INGRESS_KIND.resource, "hostname");
        }
        host.map(str::to_string)
    }

    fn extract_address(&self, obj: &DynamicObject, cache: &AddressCache) -> Option<String> {
        resolve_status_address(INGRESS_KIND, obj, self.address_source, cache)
    }
}

#[cfg(test)]
#[path = "ingress_tests.rs"]
mod ingress_tests;
