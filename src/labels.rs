// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label constants stamped on objects published by the controller.

use std::collections::BTreeMap;

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the component name within the architecture
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

// ============================================================================
// Label Values
// ============================================================================

/// Value for `app.kubernetes.io/managed-by` on the published `ConfigMap`
pub const MANAGED_BY_DNSHORTCUT: &str = "dnshortcut";

/// Component value for the published DNS configuration
pub const COMPONENT_DNS_OVERRIDES: &str = "dns-overrides";

/// Labels applied to the published `ConfigMap`.
#[must_use]
pub fn build_configmap_labels() -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_DNSHORTCUT.into());
    labels.insert(K8S_COMPONENT.into(), COMPONENT_DNS_OVERRIDES.into());
    labels
}
