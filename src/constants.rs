// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the dnshortcut controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Published Config Object Constants
// ============================================================================

/// Name of the `ConfigMap` CoreDNS imports custom configuration from
pub const CUSTOM_CONFIGMAP_NAME: &str = "coredns-custom";

/// Namespace holding the CoreDNS custom `ConfigMap`
pub const CUSTOM_CONFIGMAP_NAMESPACE: &str = "kube-system";

/// Key for the single hosts block; `*.override` keys are imported into the default server block
pub const HOSTS_OVERRIDE_KEY: &str = "hosts.override";

/// Key for the per-base-domain server blocks; `*.server` keys are imported as standalone servers
pub const ZONES_SERVER_KEY: &str = "dnshortcut.server";

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "dnshortcut";

/// Header comment written at the top of every generated file
pub const GENERATED_HEADER: &str = "# Generated by dnshortcut";

// ============================================================================
// Reconciliation Constants
// ============================================================================

/// Debounce window between reconciliation passes (5 seconds)
pub const DEFAULT_DEBOUNCE_WINDOW_SECS: u64 = 5;

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Standard DNS port the generated server blocks listen on
pub const DNS_PORT: u16 = 53;

/// Cache TTL for generated server blocks (30 seconds)
pub const ZONE_CACHE_TTL_SECS: u32 = 30;

/// Upstream used by generated server blocks for names not in the hosts table
pub const UPSTREAM_RESOLVER: &str = "/etc/resolv.conf";

// ============================================================================
// Watched Resource Constants
// ============================================================================

/// Service type whose external address is fed into the address cache
pub const SERVICE_TYPE_LOAD_BALANCER: &str = "LoadBalancer";

/// `spec.clusterIP` value of headless services
pub const CLUSTER_IP_NONE: &str = "None";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 2;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for liveness endpoint
pub const HEALTH_SERVER_PATH: &str = "/healthz";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
