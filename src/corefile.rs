// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CoreDNS configuration generation.
//!
//! Turns a hostname table snapshot into text CoreDNS can import from the
//! `coredns-custom` `ConfigMap`. Two layouts are supported:
//!
//! - [`ConfigFormat::Hosts`] - a single `hosts` block, imported into the
//!   default server block through a `*.override` key
//! - [`ConfigFormat::Zones`] - one standalone server block per base domain,
//!   imported through a `*.server` key
//!
//! Both generators are pure. Input records are re-sorted so the output is
//! byte-identical for identical contents, which is what makes the
//! reconciler's change detection meaningful.
//!
//! Lines are written as `address hostname`, the `/etc/hosts` order the
//! CoreDNS `hosts` plugin parses.

use crate::constants::{
    DNS_PORT, GENERATED_HEADER, HOSTS_OVERRIDE_KEY, UPSTREAM_RESOLVER, ZONES_SERVER_KEY,
    ZONE_CACHE_TTL_SECS,
};
use crate::errors::ConfigError;
use crate::hosts::HostnameRecord;
use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::str::FromStr;

const INDENT: &str = "    ";

/// Layout of the generated configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConfigFormat {
    /// Single `hosts { ... }` block
    #[default]
    Hosts,
    /// One server block per base domain
    Zones,
}

impl ConfigFormat {
    /// `ConfigMap` key CoreDNS expects this layout under.
    #[must_use]
    pub fn default_key(self) -> &'static str {
        match self {
            ConfigFormat::Hosts => HOSTS_OVERRIDE_KEY,
            ConfigFormat::Zones => ZONES_SERVER_KEY,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigFormat::Hosts => "hosts",
            ConfigFormat::Zones => "zones",
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosts" => Ok(ConfigFormat::Hosts),
            "zones" => Ok(ConfigFormat::Zones),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

/// Generated configuration text together with the layout that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedConfig {
    pub format: ConfigFormat,
    pub text: String,
}

/// Generate configuration for `records` in the given layout.
#[must_use]
pub fn generate(format: ConfigFormat, records: &[HostnameRecord]) -> GeneratedConfig {
    let text = match format {
        ConfigFormat::Hosts => generate_hosts_block(records),
        ConfigFormat::Zones => generate_zone_blocks(records),
    };
    GeneratedConfig { format, text }
}

/// Single hosts block with a trailing `fallthrough`.
///
/// ```text
/// # Generated by dnshortcut
/// hosts {
///     10.0.0.5 app.example.com
///     fallthrough
/// }
/// ```
#[must_use]
pub fn generate_hosts_block(records: &[HostnameRecord]) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push('\n');
    write_hosts_block(&mut out, "", &sorted(records));
    out.trim().to_string()
}

/// One CoreDNS server block per base domain, sorted by domain.
///
/// Each block answers from its own `hosts` table and forwards everything
/// else to the node resolver.
#[must_use]
pub fn generate_zone_blocks(records: &[HostnameRecord]) -> String {
    let mut domains: BTreeMap<&str, Vec<&HostnameRecord>> = BTreeMap::new();
    for record in records {
        domains
            .entry(base_domain(&record.hostname))
            .or_default()
            .push(record);
    }

    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push('\n');

    for (domain, mut members) in domains {
        members.sort();
        out.push('\n');
        let _ = writeln!(out, "{domain}:{DNS_PORT} {{");
        let _ = writeln!(out, "{INDENT}errors");
        write_hosts_block(&mut out, INDENT, &members);
        let _ = writeln!(out, "{INDENT}forward . {UPSTREAM_RESOLVER}");
        let _ = writeln!(out, "{INDENT}cache {ZONE_CACHE_TTL_SECS}");
        let _ = writeln!(out, "{INDENT}loop");
        let _ = writeln!(out, "{INDENT}reload");
        let _ = writeln!(out, "{INDENT}loadbalance");
        out.push_str("}\n");
    }

    out.trim().to_string()
}

/// Strip the leftmost label: `app.example.com` becomes `example.com`.
///
/// A single-label name has nothing to strip and is its own base domain.
#[must_use]
pub fn base_domain(hostname: &str) -> &str {
    match hostname.split_once('.') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => hostname,
    }
}

fn sorted(records: &[HostnameRecord]) -> Vec<&HostnameRecord> {
    let mut refs: Vec<&HostnameRecord> = records.iter().collect();
    refs.sort();
    refs
}

fn write_hosts_block(out: &mut String, indent: &str, records: &[&HostnameRecord]) {
    let _ = writeln!(out, "{indent}hosts {{");
    for record in records {
        let _ = writeln!(
            out,
            "{indent}{INDENT}{} {}",
            record.address, record.hostname
        );
    }
    let _ = writeln!(out, "{indent}{INDENT}fallthrough");
    let _ = writeln!(out, "{indent}}}");
}

#[cfg(test)]
#[path = "corefile_tests.rs"]
mod corefile_tests;
