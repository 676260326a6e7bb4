// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line and environment configuration.
//!
//! Every flag can also be set through a `DNSHORTCUT_*` environment variable.
//! Log verbosity is not configured here; it follows `RUST_LOG` and
//! `RUST_LOG_FORMAT`.

use crate::adapters::{default_adapters, AddressSource, IngressAdapter, ResourceAdapter};
use crate::constants::{
    CUSTOM_CONFIGMAP_NAME, CUSTOM_CONFIGMAP_NAMESPACE, DEFAULT_DEBOUNCE_WINDOW_SECS,
    METRICS_SERVER_PORT,
};
use crate::context::ReconcilerSettings;
use crate::corefile::ConfigFormat;
use crate::errors::ConfigError;
use crate::publisher::PublishTarget;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "dnshortcut")]
#[command(
    about = "Publishes CoreDNS overrides so in-cluster clients reach ingress hostnames without the load balancer",
    long_about = None
)]
pub struct Args {
    /// Output layout: `hosts` (one hosts block) or `zones` (one server block per base domain)
    #[arg(long, env = "DNSHORTCUT_FORMAT", default_value = "hosts")]
    pub format: String,

    /// Name of the ConfigMap the generated config is written to
    #[arg(long, env = "DNSHORTCUT_CONFIGMAP_NAME", default_value = CUSTOM_CONFIGMAP_NAME)]
    pub configmap_name: String,

    /// Namespace of that ConfigMap
    #[arg(long, env = "DNSHORTCUT_CONFIGMAP_NAMESPACE", default_value = CUSTOM_CONFIGMAP_NAMESPACE)]
    pub configmap_namespace: String,

    /// Data key to write; defaults to the format's well-known key
    #[arg(long, env = "DNSHORTCUT_CONFIGMAP_KEY")]
    pub configmap_key: Option<String>,

    /// Minimum seconds between two publishes
    #[arg(long, env = "DNSHORTCUT_DEBOUNCE_SECS", default_value_t = DEFAULT_DEBOUNCE_WINDOW_SECS)]
    pub debounce_secs: u64,

    /// Port for `/metrics` and `/healthz`
    #[arg(long, env = "DNSHORTCUT_METRICS_PORT", default_value_t = METRICS_SERVER_PORT)]
    pub metrics_port: u16,

    /// Also watch `networking.k8s.io/v1` Ingresses
    #[arg(long, env = "DNSHORTCUT_WATCH_INGRESSES")]
    pub watch_ingresses: bool,

    /// How Ingress status addresses are read: `load-balancer` or `direct`
    #[arg(long, env = "DNSHORTCUT_INGRESS_ADDRESS_SOURCE", default_value = "load-balancer")]
    pub ingress_address_source: String,
}

impl Args {
    /// Validate flags and build the reconciler settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unknown format or a zero debounce window.
    pub fn reconciler_settings(&self) -> Result<ReconcilerSettings, ConfigError> {
        let format: ConfigFormat = self.format.parse()?;
        if self.debounce_secs < 1 {
            return Err(ConfigError::DebounceTooShort(self.debounce_secs));
        }

        let key = self
            .configmap_key
            .clone()
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| format.default_key().to_string());

        Ok(ReconcilerSettings {
            target: PublishTarget::new(&self.configmap_name, &self.configmap_namespace, key),
            format,
            debounce: Duration::from_secs(self.debounce_secs),
        })
    }

    /// Adapters to register, `HTTPProxy` first.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unknown ingress address source.
    pub fn adapters(&self) -> Result<Vec<Arc<dyn ResourceAdapter>>, ConfigError> {
        let source: AddressSource = self.ingress_address_source.parse()?;

        let mut adapters = default_adapters();
        if self.watch_ingresses {
            adapters.push(Arc::new(IngressAdapter::new(source)));
        }
        Ok(adapters)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
