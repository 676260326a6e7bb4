// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Load balancer address to cluster address lookup.
//!
//! Ingress controllers such as Contour only publish the external load
//! balancer address on the objects they manage. [`AddressCache`] maps that
//! external address back to the `clusterIP` of the `LoadBalancer` service
//! fronting it, so in-cluster clients can skip the load balancer.
//!
//! The cache is fed exclusively by the service watcher. A miss simply means
//! the service has not been observed yet. Like the hostname table, it is
//! guarded by the [`crate::context::ReconcilerContext`] lock.

use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct AddressCache {
    entries: HashMap<String, String>,
}

impl AddressCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `external` is served by `internal`, replacing any earlier mapping.
    pub fn put(&mut self, external: &str, internal: &str) {
        self.entries
            .insert(external.to_string(), internal.to_string());
    }

    /// Internal address for `external`, `None` if no service exposes it yet.
    #[must_use]
    pub fn get(&self, external: &str) -> Option<&str> {
        self.entries.get(external).map(String::as_str)
    }

    /// Drop the mapping for `external`, but only while it still points at `internal`.
    ///
    /// A newer service that took over the external address keeps its entry.
    /// Returns whether an entry was removed.
    pub fn prune(&mut self, external: &str, internal: &str) -> bool {
        if self.get(external) == Some(internal) {
            self.entries.remove(external);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod cache_tests;
