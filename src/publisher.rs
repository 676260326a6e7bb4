// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Persisting generated configuration.
//!
//! The reconciler only knows the [`ConfigPublisher`] trait. In production the
//! text lands in a `ConfigMap` through server-side apply ([`ConfigMapPublisher`]);
//! tests swap in an in-memory implementation.

use crate::constants::FIELD_MANAGER;
use crate::errors::PublishError;
use crate::labels::build_configmap_labels;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

/// Where generated configuration is stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishTarget {
    /// `ConfigMap` name
    pub name: String,
    /// `ConfigMap` namespace
    pub namespace: String,
    /// Data key holding the generated text
    pub key: String,
}

impl PublishTarget {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            key: key.into(),
        }
    }
}

/// Create-or-replace of a key-value config object.
///
/// A single attempt per call: retrying is left to the next reconciliation.
#[async_trait::async_trait]
pub trait ConfigPublisher: Send + Sync {
    /// Upsert `data` into the config object `namespace/name`.
    ///
    /// # Errors
    ///
    /// Returns a [`PublishError`] if the object could not be written.
    async fn apply(
        &self,
        name: &str,
        namespace: &str,
        data: BTreeMap<String, String>,
    ) -> Result<(), PublishError>;
}

/// Publishes to a `ConfigMap` with server-side apply.
///
/// Only the keys in `data` are owned by the field manager, so other keys in a
/// shared `ConfigMap` such as `coredns-custom` are left alone.
#[derive(Clone)]
pub struct ConfigMapPublisher {
    client: Client,
}

impl ConfigMapPublisher {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ConfigPublisher for ConfigMapPublisher {
    async fn apply(
        &self,
        name: &str,
        namespace: &str,
        data: BTreeMap<String, String>,
    ) -> Result<(), PublishError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);

        let patch = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": name,
                "namespace": namespace,
                "labels": build_configmap_labels(),
            },
            "data": data,
        });

        debug!(name, namespace, "Applying ConfigMap");
        api.patch(
            name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&patch),
        )
        .await
        .map_err(|source| PublishError::ApplyFailed {
            name: name.to_string(),
            namespace: namespace.to_string(),
            source,
        })?;

        Ok(())
    }
}
