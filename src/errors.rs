// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for dnshortcut.
//!
//! Extraction and cache misses are not errors: adapters report them as `None`.
//! The types here cover the two places where something can actually go wrong:
//! - Publishing generated configuration to the cluster
//! - Parsing controller settings at startup

use thiserror::Error;

/// Errors returned by a [`crate::publisher::ConfigPublisher`].
///
/// The reconciler logs these and moves on; they never reach the callers of
/// the mutation API.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The Kubernetes API rejected or failed the server-side apply
    ///
    /// Typical causes are missing RBAC permissions on the target namespace
    /// or a connectivity problem with the API server.
    #[error("Failed to apply ConfigMap {namespace}/{name}: {source}")]
    ApplyFailed {
        /// Name of the `ConfigMap`
        name: String,
        /// Namespace of the `ConfigMap`
        namespace: String,
        /// Underlying API error
        #[source]
        source: kube::Error,
    },
}

/// Errors raised while validating controller settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Unrecognized output format name
    #[error("Unknown config format '{0}', expected 'hosts' or 'zones'")]
    UnknownFormat(String),

    /// Unrecognized address source for an adapter
    #[error("Unknown address source '{0}', expected 'load-balancer' or 'direct'")]
    UnknownAddressSource(String),

    /// The debounce window must leave room for coalescing
    #[error("Debounce window must be at least 1 second, got {0}")]
    DebounceTooShort(u64),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
