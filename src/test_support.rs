// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared fixtures for unit tests.

use crate::errors::PublishError;
use crate::publisher::ConfigPublisher;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::api::DynamicObject;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A Contour `HTTPProxy` with optional fqdn and load balancer IP.
pub fn httpproxy(name: &str, fqdn: Option<&str>, lb_ip: Option<&str>) -> DynamicObject {
    let mut body = json!({
        "apiVersion": "projectcontour.io/v1",
        "kind": "HTTPProxy",
        "metadata": { "name": name, "namespace": "default" },
        "spec": {},
    });
    if let Some(fqdn) = fqdn {
        body["spec"] = json!({ "virtualhost": { "fqdn": fqdn } });
    }
    if let Some(ip) = lb_ip {
        body["status"] = json!({ "loadBalancer": { "ingress": [{ "ip": ip }] } });
    }
    dynamic(body)
}

/// A `networking.k8s.io/v1` `Ingress` with optional host and status address.
pub fn ingress(name: &str, host: Option<&str>, lb_ip: Option<&str>) -> DynamicObject {
    let mut body = json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "Ingress",
        "metadata": { "name": name, "namespace": "default" },
        "spec": {},
    });
    if let Some(host) = host {
        body["spec"] = json!({ "rules": [{ "host": host }] });
    }
    if let Some(ip) = lb_ip {
        body["status"] = json!({ "loadBalancer": { "ingress": [{ "ip": ip }] } });
    }
    dynamic(body)
}

pub fn dynamic(body: Value) -> DynamicObject {
    serde_json::from_value(body).expect("valid DynamicObject")
}

/// A service of the given type with an optional load balancer ingress IP.
pub fn service(name: &str, type_: &str, cluster_ip: &str, lb_ip: Option<&str>) -> Service {
    let mut body = json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": { "name": name, "namespace": "projectcontour" },
        "spec": { "type": type_, "clusterIP": cluster_ip },
    });
    if let Some(ip) = lb_ip {
        body["status"] = json!({ "loadBalancer": { "ingress": [{ "ip": ip }] } });
    }
    serde_json::from_value(body).expect("valid Service")
}

pub fn configmap(name: &str, data: &[(&str, &str)]) -> ConfigMap {
    let data: BTreeMap<String, String> = data
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": name, "namespace": "kube-system" },
        "data": data,
    }))
    .expect("valid ConfigMap")
}

/// One recorded `apply` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedConfig {
    pub name: String,
    pub namespace: String,
    pub data: BTreeMap<String, String>,
}

/// Publisher that records every call and can be told to fail the next N calls.
#[derive(Default)]
pub struct RecordingPublisher {
    applied: Mutex<Vec<AppliedConfig>>,
    failures_left: AtomicUsize,
}

impl RecordingPublisher {
    pub fn failing(times: usize) -> Self {
        Self {
            applied: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(times),
        }
    }

    pub fn calls(&self) -> Vec<AppliedConfig> {
        self.applied.lock().expect("publisher lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.applied.lock().expect("publisher lock").len()
    }
}

#[async_trait::async_trait]
impl ConfigPublisher for RecordingPublisher {
    async fn apply(
        &self,
        name: &str,
        namespace: &str,
        data: BTreeMap<String, String>,
    ) -> Result<(), PublishError> {
        self.applied
            .lock()
            .expect("publisher lock")
            .push(AppliedConfig {
                name: name.to_string(),
                namespace: namespace.to_string(),
                data,
            });

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(PublishError::ApplyFailed {
                name: name.to_string(),
                namespace: namespace.to_string(),
                source: kube::Error::Api(Box::new(kube::core::Status {
                    status: Some(kube::core::response::StatusSummary::Failure),
                    message: "apiserver unavailable".to_string(),
                    reason: "ServiceUnavailable".to_string(),
                    code: 503,
                    metadata: None,
                    details: None,
                })),
            });
        }
        Ok(())
    }
}

/// Settings pointing at the default `coredns-custom` target.
pub fn settings(format: crate::corefile::ConfigFormat) -> crate::context::ReconcilerSettings {
    crate::context::ReconcilerSettings {
        target: crate::publisher::PublishTarget::new(
            "coredns-custom",
            "kube-system",
            format.default_key(),
        ),
        format,
        debounce: std::time::Duration::from_secs(5),
    }
}
