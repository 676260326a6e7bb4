// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared reconciler context.
//!
//! Every event handler receives an `Arc<ReconcilerContext>`. It holds the
//! process-wide state behind one lock:
//! - the hostname table ([`HostnameStore`])
//! - the load balancer address cache ([`AddressCache`])
//! - the debounce scheduling state
//! - the last successfully published text
//!
//! The lock is only held for a mutation plus its scheduling decision, or
//! for taking a snapshot. It is never held across the debounce sleep or the
//! publish call, so a slow API server cannot stall event handlers.

use crate::adapters::ResourceAdapter;
use crate::cache::AddressCache;
use crate::corefile::ConfigFormat;
use crate::hosts::{HostnameRecord, HostnameStore};
use crate::publisher::{ConfigPublisher, PublishTarget};
use crate::reconciler::Scheduler;
use kube::api::DynamicObject;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Static settings for the reconciler.
#[derive(Clone, Debug)]
pub struct ReconcilerSettings {
    /// Where the generated configuration is published
    pub target: PublishTarget,
    /// Layout of the generated configuration
    pub format: ConfigFormat,
    /// Minimum spacing between reconciliation passes
    pub debounce: Duration,
}

/// Where the debounced reconciler currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileState {
    /// No pass pending or running
    Idle,
    /// A pass is scheduled but has not read the table yet
    Pending,
    /// A pass is generating or publishing
    Running,
}

/// Debounce bookkeeping.
///
/// `scheduled` stays set from the moment a pass is scheduled until that
/// pass takes its snapshot; any request in between is folded into it.
#[derive(Debug, Default)]
pub(crate) struct PendingReconcile {
    next_eligible_run: Option<Instant>,
    scheduled: bool,
    running: bool,
}

impl PendingReconcile {
    /// Decide whether a request at `now` needs a new pass.
    ///
    /// Returns the instant the new pass should start at, or `None` when an
    /// already scheduled pass will pick the change up.
    pub(crate) fn request(&mut self, now: Instant, window: Duration) -> Option<Instant> {
        if self.scheduled {
            return None;
        }
        let earliest = match self.next_eligible_run {
            Some(next) if next > now => next,
            _ => now,
        };
        let deadline = earliest + window;
        self.next_eligible_run = Some(deadline);
        self.scheduled = true;
        Some(deadline)
    }

    /// The pass is about to read the table; later requests need a new pass.
    pub(crate) fn begin_run(&mut self) {
        self.scheduled = false;
        self.running = true;
    }

    pub(crate) fn finish_run(&mut self) {
        self.running = false;
    }

    pub(crate) fn state(&self) -> ReconcileState {
        if self.scheduled {
            ReconcileState::Pending
        } else if self.running {
            ReconcileState::Running
        } else {
            ReconcileState::Idle
        }
    }

    pub(crate) fn next_eligible_run(&self) -> Option<Instant> {
        self.next_eligible_run
    }
}

/// Everything guarded by the context lock.
#[derive(Debug, Default)]
pub(crate) struct SharedState {
    pub(crate) hosts: HostnameStore,
    pub(crate) cache: AddressCache,
    pub(crate) schedule: PendingReconcile,
    pub(crate) last_published: Option<String>,
}

/// What a pass needs, captured under the lock.
pub(crate) struct PassSnapshot {
    pub(crate) records: Vec<HostnameRecord>,
    pub(crate) last_published: Option<String>,
}

pub struct ReconcilerContext {
    state: Mutex<SharedState>,
    trigger: mpsc::UnboundedSender<Instant>,
    publisher: Arc<dyn ConfigPublisher>,
    settings: ReconcilerSettings,
}

impl ReconcilerContext {
    /// Build the context and the scheduler that drives its passes.
    ///
    /// The returned [`Scheduler`] must be run (usually spawned) for any
    /// configuration to be published.
    #[must_use]
    pub fn new(
        publisher: Arc<dyn ConfigPublisher>,
        settings: ReconcilerSettings,
    ) -> (Arc<Self>, Scheduler) {
        let (trigger, trigger_rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(Self {
            state: Mutex::new(SharedState::default()),
            trigger,
            publisher,
            settings,
        });
        let scheduler = Scheduler::new(ctx.clone(), trigger_rx);
        (ctx, scheduler)
    }

    #[must_use]
    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    pub(crate) fn publisher(&self) -> &dyn ConfigPublisher {
        self.publisher.as_ref()
    }

    // ------------------------------------------------------------------------
    // Hostname table
    // ------------------------------------------------------------------------

    /// Insert or overwrite `hostname`, then request a reconcile.
    pub async fn add_or_update(&self, hostname: &str, address: &str) {
        let mut state = self.state.lock().await;
        let previous = state.hosts.add_or_update(hostname, address);
        if previous.as_deref() != Some(address) {
            info!(hostname, address, previous = ?previous, "Hostname shortcut set");
        }
        record_sizes(&state);
        self.request_reconcile_locked(&mut state);
    }

    /// Remove `hostname` if present, then request a reconcile.
    pub async fn remove(&self, hostname: &str) {
        let mut state = self.state.lock().await;
        if let Some(address) = state.hosts.remove(hostname) {
            info!(hostname, address, "Hostname shortcut removed");
        }
        record_sizes(&state);
        self.request_reconcile_locked(&mut state);
    }

    /// Sorted copy of the hostname table.
    pub async fn hostnames(&self) -> Vec<HostnameRecord> {
        self.state.lock().await.hosts.snapshot()
    }

    // ------------------------------------------------------------------------
    // Address cache
    // ------------------------------------------------------------------------

    /// Map a load balancer address to its cluster address.
    pub async fn put_address(&self, external: &str, internal: &str) {
        let mut state = self.state.lock().await;
        state.cache.put(external, internal);
        record_sizes(&state);
    }

    /// Drop a mapping if it still points at `internal`.
    pub async fn prune_address(&self, external: &str, internal: &str) -> bool {
        let mut state = self.state.lock().await;
        let pruned = state.cache.prune(external, internal);
        record_sizes(&state);
        pruned
    }

    pub async fn lookup_address(&self, external: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .cache
            .get(external)
            .map(str::to_string)
    }

    /// Run an adapter's address extraction against the current cache.
    pub async fn extract_address(
        &self,
        adapter: &dyn ResourceAdapter,
        obj: &DynamicObject,
    ) -> Option<String> {
        let state = self.state.lock().await;
        adapter.extract_address(obj, &state.cache)
    }

    // ------------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------------

    /// Ask for a reconciliation pass within one debounce window.
    pub async fn request_reconcile(&self) {
        let mut state = self.state.lock().await;
        self.request_reconcile_locked(&mut state);
    }

    fn request_reconcile_locked(&self, state: &mut SharedState) {
        let now = Instant::now();
        let Some(deadline) = state.schedule.request(now, self.settings.debounce) else {
            debug!("Reconcile already pending, change will be included");
            return;
        };

        debug!(
            delay_ms = deadline.saturating_duration_since(now).as_millis(),
            "Reconcile scheduled"
        );
        if self.trigger.send(deadline).is_err() {
            error!("Reconcile scheduler is not running, change will not be published");
        }
    }

    pub async fn reconcile_state(&self) -> ReconcileState {
        self.state.lock().await.schedule.state()
    }

    pub async fn next_eligible_run(&self) -> Option<Instant> {
        self.state.lock().await.schedule.next_eligible_run()
    }

    /// Mark a pass as started and capture what it needs.
    pub(crate) async fn begin_pass(&self) -> PassSnapshot {
        let mut state = self.state.lock().await;
        state.schedule.begin_run();
        PassSnapshot {
            records: state.hosts.snapshot(),
            last_published: state.last_published.clone(),
        }
    }

    /// Mark the running pass as done, recording `published` text on success.
    pub(crate) async fn finish_pass(&self, published: Option<String>) {
        let mut state = self.state.lock().await;
        if let Some(text) = published {
            state.last_published = Some(text);
        }
        state.schedule.finish_run();
    }

    // ------------------------------------------------------------------------
    // Published config
    // ------------------------------------------------------------------------

    /// Seed the last published text from the stored config object.
    ///
    /// Called when the config object is observed, typically right after
    /// startup, so an unchanged table does not cause a republish. A reconcile
    /// is requested so content edited by someone else is converged back.
    pub async fn observe_published(&self, text: &str) {
        let mut state = self.state.lock().await;
        if state.last_published.as_deref() != Some(text) {
            debug!(bytes = text.len(), "Seeded last published config");
            state.last_published = Some(text.to_string());
        }
        self.request_reconcile_locked(&mut state);
    }

    /// Forget the published text after the config object was deleted.
    ///
    /// The next pass then recreates it even if the table is unchanged.
    pub async fn forget_published(&self) {
        let mut state = self.state.lock().await;
        state.last_published = None;
        self.request_reconcile_locked(&mut state);
    }

    pub async fn last_published(&self) -> Option<String> {
        self.state.lock().await.last_published.clone()
    }
}

fn record_sizes(state: &SharedState) {
    crate::metrics::record_table_sizes(state.hosts.len(), state.cache.len());
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
