// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Debounced reconciliation.
//!
//! A single long-lived [`Scheduler`] task receives "run at" instants from
//! [`crate::context::ReconcilerContext::request_reconcile`]. The context only
//! sends one while no pass is pending, so bursts of mutations collapse into
//! one pass per debounce window and the channel never holds more than one
//! entry.
//!
//! Each pass reads the hostname table after the debounce sleep, so every
//! mutation made before the pass started is included. Mutations made while
//! a pass is running schedule the next one.

use crate::context::ReconcilerContext;
use crate::corefile::generate;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant as StdInstant;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info};

/// Result of one reconciliation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// Generated text matched the last published text
    UpToDate,
    /// New text was published
    Published,
    /// Publishing failed; the text was not recorded as published
    Failed,
}

impl PassOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PassOutcome::UpToDate => "up_to_date",
            PassOutcome::Published => "published",
            PassOutcome::Failed => "failed",
        }
    }
}

/// Drives reconciliation passes for one [`ReconcilerContext`].
pub struct Scheduler {
    ctx: Arc<ReconcilerContext>,
    trigger: mpsc::UnboundedReceiver<Instant>,
}

impl Scheduler {
    pub(crate) fn new(ctx: Arc<ReconcilerContext>, trigger: mpsc::UnboundedReceiver<Instant>) -> Self {
        Self { ctx, trigger }
    }

    /// Run passes as they come due, for the life of the process.
    ///
    /// The scheduler holds the context, which owns the trigger sender, so the
    /// channel never closes and this does not return.
    pub async fn run(mut self) {
        info!(
            debounce_secs = self.ctx.settings().debounce.as_secs_f64(),
            format = %self.ctx.settings().format,
            "Reconcile scheduler started"
        );

        while let Some(deadline) = self.trigger.recv().await {
            sleep_until(deadline).await;
            reconcile_once(&self.ctx).await;
        }

        debug!("Reconcile scheduler stopped");
    }
}

/// Run one reconciliation pass.
///
/// Snapshots the table, generates the configuration and publishes it unless
/// it is byte-identical to what was last published. A failed publish is
/// logged and not retried; the next mutation triggers another attempt.
pub async fn reconcile_once(ctx: &ReconcilerContext) -> PassOutcome {
    let start = StdInstant::now();
    let settings = ctx.settings();
    let snapshot = ctx.begin_pass().await;

    let generated = generate(settings.format, &snapshot.records);

    if snapshot.last_published.as_deref() == Some(generated.text.as_str()) {
        info!(
            hostnames = snapshot.records.len(),
            "CoreDNS config is up to date"
        );
        ctx.finish_pass(None).await;
        return finish(PassOutcome::UpToDate, start);
    }

    let target = &settings.target;
    let mut data = BTreeMap::new();
    data.insert(target.key.clone(), generated.text.clone());

    let outcome = match ctx
        .publisher()
        .apply(&target.name, &target.namespace, data)
        .await
    {
        Ok(()) => {
            info!(
                configmap = %format!("{}/{}", target.namespace, target.name),
                key = %target.key,
                format = %generated.format,
                hostnames = snapshot.records.len(),
                "Published CoreDNS config"
            );
            ctx.finish_pass(Some(generated.text)).await;
            PassOutcome::Published
        }
        Err(e) => {
            error!(
                error = %e,
                configmap = %format!("{}/{}", target.namespace, target.name),
                "Failed to publish CoreDNS config, will retry on next change"
            );
            ctx.finish_pass(None).await;
            PassOutcome::Failed
        }
    };

    finish(outcome, start)
}

fn finish(outcome: PassOutcome, start: StdInstant) -> PassOutcome {
    crate::metrics::record_reconciliation(outcome.as_str(), start.elapsed());
    outcome
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;
