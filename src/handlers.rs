// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Inbound event handlers.
//!
//! Watchers call these for every object event. Resource events go through
//! the matching [`ResourceAdapter`] and end up as hostname table mutations;
//! `Service` events feed the address cache; the published `ConfigMap`
//! seeds the last published text.
//!
//! Handlers never fail. A missing hostname or address means the object
//! does not contribute a record right now.

use crate::adapters::ResourceAdapter;
use crate::constants::{CLUSTER_IP_NONE, SERVICE_TYPE_LOAD_BALANCER};
use crate::context::ReconcilerContext;
use crate::metrics::record_resource_event;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::api::DynamicObject;
use kube::ResourceExt;
use tracing::{debug, info};

const SERVICE_RESOURCE: &str = "services";
const CONFIGMAP_RESOURCE: &str = "configmaps";

/// A resource object appeared.
pub async fn on_resource_added(
    ctx: &ReconcilerContext,
    adapter: &dyn ResourceAdapter,
    obj: &DynamicObject,
) {
    let kind = adapter.resource_kind();
    record_resource_event(kind.resource, "added");

    let Some(hostname) = adapter.extract_hostname(obj) else {
        return;
    };
    let Some(address) = ctx.extract_address(adapter, obj).await else {
        debug!(
            resource = %kind,
            name = %obj.name_any(),
            hostname,
            "Skipping object without a resolvable address"
        );
        return;
    };

    ctx.add_or_update(&hostname, &address).await;
}

/// A resource object changed.
///
/// A renamed hostname drops the old record. The new one is (re)written
/// whenever both fields resolve, so an address that shows up in status
/// later is picked up.
pub async fn on_resource_updated(
    ctx: &ReconcilerContext,
    adapter: &dyn ResourceAdapter,
    old: &DynamicObject,
    new: &DynamicObject,
) {
    let kind = adapter.resource_kind();
    record_resource_event(kind.resource, "updated");

    let old_hostname = adapter.extract_hostname(old);
    let new_hostname = adapter.extract_hostname(new);

    if let Some(old_hostname) = old_hostname.as_deref() {
        if new_hostname.as_deref() != Some(old_hostname) {
            debug!(
                resource = %kind,
                name = %new.name_any(),
                old = old_hostname,
                new = ?new_hostname,
                "Hostname changed"
            );
            ctx.remove(old_hostname).await;
        }
    }

    let Some(hostname) = new_hostname else {
        return;
    };
    if let Some(address) = ctx.extract_address(adapter, new).await {
        ctx.add_or_update(&hostname, &address).await;
    }
}

/// A resource object went away.
pub async fn on_resource_deleted(
    ctx: &ReconcilerContext,
    adapter: &dyn ResourceAdapter,
    obj: &DynamicObject,
) {
    record_resource_event(adapter.resource_kind().resource, "deleted");

    if let Some(hostname) = adapter.extract_hostname(obj) {
        ctx.remove(&hostname).await;
    }
}

/// External and cluster address of a `LoadBalancer` service, if it has both.
#[must_use]
pub fn service_addresses(service: &Service) -> Option<(String, String)> {
    let spec = service.spec.as_ref()?;
    if spec.type_.as_deref() != Some(SERVICE_TYPE_LOAD_BALANCER) {
        return None;
    }

    let cluster_ip = spec
        .cluster_ip
        .as_deref()
        .filter(|ip| !ip.is_empty() && *ip != CLUSTER_IP_NONE)?;

    let ingress = service
        .status
        .as_ref()?
        .load_balancer
        .as_ref()?
        .ingress
        .as_ref()?
        .first()?;
    let external = ingress
        .ip
        .as_deref()
        .filter(|ip| !ip.is_empty())
        .or_else(|| ingress.hostname.as_deref().filter(|h| !h.is_empty()))?;

    Some((external.to_string(), cluster_ip.to_string()))
}

/// A `Service` appeared or changed.
pub async fn on_service_applied(ctx: &ReconcilerContext, service: &Service) {
    record_resource_event(SERVICE_RESOURCE, "applied");

    let Some((external, internal)) = service_addresses(service) else {
        return;
    };
    if ctx.lookup_address(&external).await.as_deref() == Some(internal.as_str()) {
        return;
    }

    debug!(
        service = %service.name_any(),
        namespace = ?service.namespace(),
        external_ip = %external,
        cluster_ip = %internal,
        "Caching load balancer address"
    );
    ctx.put_address(&external, &internal).await;
}

/// A `Service` changed.
///
/// A load balancer that moved to another external address, or lost it,
/// drops the old mapping before the new one is cached.
pub async fn on_service_updated(ctx: &ReconcilerContext, old: &Service, new: &Service) {
    if let (Some((external, internal)), current) =
        (service_addresses(old), service_addresses(new))
    {
        let moved = current
            .as_ref()
            .is_none_or(|(ext, int)| *ext != external || *int != internal);
        if moved && ctx.prune_address(&external, &internal).await {
            debug!(
                service = %old.name_any(),
                external_ip = %external,
                "Pruned stale load balancer address"
            );
        }
    }

    on_service_applied(ctx, new).await;
}

/// A `Service` went away.
pub async fn on_service_deleted(ctx: &ReconcilerContext, service: &Service) {
    record_resource_event(SERVICE_RESOURCE, "deleted");

    let Some((external, internal)) = service_addresses(service) else {
        return;
    };
    if ctx.prune_address(&external, &internal).await {
        debug!(
            service = %service.name_any(),
            external_ip = %external,
            "Pruned load balancer address"
        );
    }
}

/// The published `ConfigMap` was observed.
///
/// Seeds the last published text from the configured key. If the key is
/// missing after something was published, it was removed by someone else
/// and the next pass writes it back.
pub async fn on_config_observed(ctx: &ReconcilerContext, configmap: &ConfigMap) {
    record_resource_event(CONFIGMAP_RESOURCE, "observed");

    let key = &ctx.settings().target.key;
    let Some(text) = configmap.data.as_ref().and_then(|data| data.get(key)) else {
        if ctx.last_published().await.is_some() {
            info!(
                configmap = %configmap.name_any(),
                key = %key,
                "Generated key removed from ConfigMap, it will be restored"
            );
            ctx.forget_published().await;
        } else {
            debug!(
                configmap = %configmap.name_any(),
                key = %key,
                "ConfigMap has no generated key yet"
            );
        }
        return;
    };

    ctx.observe_published(text).await;
}

/// The published `ConfigMap` was deleted.
pub async fn on_config_deleted(ctx: &ReconcilerContext, configmap: &ConfigMap) {
    record_resource_event(CONFIGMAP_RESOURCE, "deleted");
    info!(
        configmap = %configmap.name_any(),
        "Published ConfigMap deleted, it will be recreated"
    );
    ctx.forget_published().await;
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod handlers_tests;
