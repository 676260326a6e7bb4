// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory hostname to address table.
//!
//! [`HostnameStore`] is the single source of truth for what the generated
//! resolver configuration should contain. It is not synchronized on its own;
//! [`crate::context::ReconcilerContext`] owns it behind its lock.

use std::collections::BTreeMap;

/// One hostname shortcut: `hostname` should resolve to `address`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct HostnameRecord {
    /// Fully qualified hostname, used as the unique key
    pub hostname: String,
    /// Internal address, opaque (IPv4, IPv6 or a name)
    pub address: String,
}

impl HostnameRecord {
    #[must_use]
    pub fn new(hostname: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            address: address.into(),
        }
    }
}

/// Mapping from hostname to internal address, last writer wins.
///
/// Backed by a `BTreeMap` so that snapshots come out sorted by hostname and
/// the generated text is byte-stable for identical contents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostnameStore {
    records: BTreeMap<String, String>,
}

impl HostnameStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the address for `hostname`.
    ///
    /// Returns the previous address if there was one.
    pub fn add_or_update(&mut self, hostname: &str, address: &str) -> Option<String> {
        self.records.insert(hostname.to_string(), address.to_string())
    }

    /// Delete `hostname`. Removing an unknown hostname is a no-op.
    ///
    /// Returns the address that was removed, if any.
    pub fn remove(&mut self, hostname: &str) -> Option<String> {
        self.records.remove(hostname)
    }

    #[must_use]
    pub fn get(&self, hostname: &str) -> Option<&str> {
        self.records.get(hostname).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy of the current contents, sorted by hostname.
    #[must_use]
    pub fn snapshot(&self) -> Vec<HostnameRecord> {
        self.records
            .iter()
            .map(|(hostname, address)| HostnameRecord::new(hostname.as_str(), address.as_str()))
            .collect()
    }
}

#[cfg(test)]
#[path = "hosts_tests.rs"]
mod hosts_tests;
