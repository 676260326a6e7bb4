// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # dnshortcut - CoreDNS hostname shortcuts for Kubernetes
//!
//! dnshortcut watches ingress objects (Contour `HTTPProxy`, optionally
//! `Ingress`) and publishes CoreDNS overrides that resolve their hostnames
//! straight to the cluster address of the load balancer service. Pods then
//! reach in-cluster ingress hostnames without hairpinning through the
//! external load balancer.
//!
//! ## Overview
//!
//! - Resource adapters read a hostname and an address from each object
//! - Load balancer addresses are mapped back to service cluster IPs
//! - Table changes are debounced into one CoreDNS config publish per window
//! - The config is written to a `ConfigMap` with server-side apply
//!
//! ## Modules
//!
//! - [`adapters`] - Hostname and address extraction per resource kind
//! - [`hosts`] - The hostname table
//! - [`cache`] - Load balancer to cluster address lookup
//! - [`corefile`] - CoreDNS config generation (hosts block or per-domain zones)
//! - [`context`] - Shared state and the mutation API
//! - [`reconciler`] - Debounced reconciliation passes
//! - [`handlers`] - Watch event handlers
//! - [`watchers`] - Cluster watch streams
//! - [`publisher`] - `ConfigMap` publishing
//!
//! ## Example
//!
//! ```rust,no_run
//! use dnshortcut::corefile::{generate, ConfigFormat};
//! use dnshortcut::hosts::HostnameStore;
//!
//! let mut store = HostnameStore::new();
//! store.add_or_update("app.example.com", "10.96.0.15");
//!
//! let config = generate(ConfigFormat::Hosts, &store.snapshot());
//! assert!(config.text.contains("10.96.0.15 app.example.com"));
//! ```

pub mod adapters;
pub mod cache;
pub mod config;
pub mod constants;
pub mod context;
pub mod corefile;
pub mod errors;
pub mod handlers;
pub mod hosts;
pub mod labels;
pub mod metrics;
pub mod publisher;
pub mod reconciler;
pub mod server;
pub mod watchers;

#[cfg(test)]
mod test_support;
