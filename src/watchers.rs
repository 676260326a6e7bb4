// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster watch plumbing.
//!
//! Three kinds of watch streams feed the [`ReconcilerContext`]:
//! - one `Service` watch across all namespaces, feeding the address cache
//! - one `ConfigMap` watch on the published object, seeding the last
//!   published text
//! - one dynamic watch per registered [`ResourceAdapter`]
//!
//! The resource watches only start after the first two completed their
//! initial list, so adapters see a populated cache and the initial burst
//! of adds is compared against what is already published.
//!
//! `kube` watchers hand out the new object only. [`ObjectTracker`] keeps the
//! last seen object per `namespace/name` to turn events into
//! added/updated/deleted changes, and reports objects that vanished while
//! the watch was relisting as deleted.

use crate::adapters::ResourceAdapter;
use crate::context::ReconcilerContext;
use crate::handlers::{
    on_config_deleted, on_config_observed, on_resource_added, on_resource_deleted,
    on_resource_updated, on_service_applied, on_service_deleted, on_service_updated,
};
use anyhow::{bail, Result};
use futures::future::try_join_all;
use futures::{Future, StreamExt};
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::api::DynamicObject;
use kube::runtime::watcher::{self, Event};
use kube::runtime::WatchStreamExt;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// What happened to one object, with the previous version on updates.
#[derive(Clone, Debug, PartialEq)]
pub enum Change<K> {
    Added(K),
    Updated { old: K, new: K },
    Deleted(K),
}

/// Last seen version of every object on one watch stream.
#[derive(Debug)]
pub struct ObjectTracker<K> {
    known: HashMap<String, K>,
    relisting: Option<HashSet<String>>,
}

impl<K> Default for ObjectTracker<K> {
    fn default() -> Self {
        Self {
            known: HashMap::new(),
            relisting: None,
        }
    }
}

impl<K: Resource + Clone> ObjectTracker<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(obj: &K) -> String {
        format!("{}/{}", obj.namespace().unwrap_or_default(), obj.name_any())
    }

    /// Fold one watch event into the tracker and return the resulting changes.
    pub fn handle(&mut self, event: Event<K>) -> Vec<Change<K>> {
        match event {
            Event::Apply(obj) => vec![self.apply(obj)],
            Event::Delete(obj) => {
                self.known.remove(&Self::key(&obj));
                vec![Change::Deleted(obj)]
            }
            Event::Init => {
                self.relisting = Some(HashSet::new());
                Vec::new()
            }
            Event::InitApply(obj) => {
                if let Some(seen) = self.relisting.as_mut() {
                    seen.insert(Self::key(&obj));
                }
                vec![self.apply(obj)]
            }
            Event::InitDone => {
                let Some(seen) = self.relisting.take() else {
                    return Vec::new();
                };
                let gone: Vec<String> = self
                    .known
                    .keys()
                    .filter(|key| !seen.contains(*key))
                    .cloned()
                    .collect();
                gone.into_iter()
                    .filter_map(|key| self.known.remove(&key))
                    .map(Change::Deleted)
                    .collect()
            }
        }
    }

    fn apply(&mut self, obj: K) -> Change<K> {
        match self.known.insert(Self::key(&obj), obj.clone()) {
            Some(old) => Change::Updated { old, new: obj },
            None => Change::Added(obj),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

/// Drive one watch stream, passing every change to `on_change`.
///
/// `ready` fires after the first complete initial list. Watch errors are
/// retried with the default backoff; the stream only ends if the client
/// goes away, which is reported as an error.
async fn drive<K, F, Fut>(
    api: Api<K>,
    config: watcher::Config,
    stream_name: String,
    mut ready: Option<oneshot::Sender<()>>,
    mut on_change: F,
) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + 'static,
    F: FnMut(Change<K>) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut stream = watcher::watcher(api, config).default_backoff().boxed();
    let mut tracker = ObjectTracker::new();

    while let Some(event) = stream.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!(stream = %stream_name, error = %e, "Watch error, retrying with backoff");
                continue;
            }
        };
        let init_done = matches!(event, Event::InitDone);

        for change in tracker.handle(event) {
            on_change(change).await;
        }

        if init_done {
            debug!(stream = %stream_name, objects = tracker.len(), "Initial list complete");
            if let Some(ready) = ready.take() {
                // Receiver only goes away when startup is being torn down
                let _ = ready.send(());
            }
        }
    }

    bail!("Watch stream for {stream_name} ended")
}

/// Feed `LoadBalancer` services into the address cache.
async fn watch_services(
    client: Client,
    ctx: Arc<ReconcilerContext>,
    ready: oneshot::Sender<()>,
) -> Result<()> {
    info!("Starting Service watcher");
    let api = Api::<Service>::all(client);

    drive(
        api,
        watcher::Config::default(),
        "services".to_string(),
        Some(ready),
        |change| {
            let ctx = ctx.clone();
            async move {
                match change {
                    Change::Added(svc) => on_service_applied(&ctx, &svc).await,
                    Change::Updated { old, new } => on_service_updated(&ctx, &old, &new).await,
                    Change::Deleted(svc) => on_service_deleted(&ctx, &svc).await,
                }
            }
        },
    )
    .await
}

/// Watch the published `ConfigMap` to seed the last published text.
async fn watch_config(
    client: Client,
    ctx: Arc<ReconcilerContext>,
    ready: oneshot::Sender<()>,
) -> Result<()> {
    let target = ctx.settings().target.clone();
    info!(
        configmap = %format!("{}/{}", target.namespace, target.name),
        key = %target.key,
        "Starting ConfigMap watcher"
    );
    let api = Api::<ConfigMap>::namespaced(client, &target.namespace);
    let config = watcher::Config::default().fields(&format!("metadata.name={}", target.name));

    drive(api, config, "configmaps".to_string(), Some(ready), |change| {
        let ctx = ctx.clone();
        async move {
            match change {
                Change::Added(cm) | Change::Updated { new: cm, .. } => {
                    on_config_observed(&ctx, &cm).await;
                }
                Change::Deleted(cm) => on_config_deleted(&ctx, &cm).await,
            }
        }
    })
    .await
}

/// Watch one adapter's resource kind across all namespaces.
async fn watch_resources(
    client: Client,
    ctx: Arc<ReconcilerContext>,
    adapter: Arc<dyn ResourceAdapter>,
) -> Result<()> {
    let kind = adapter.resource_kind();
    info!(resource = %kind, "Starting resource watcher");
    let api = Api::<DynamicObject>::all_with(client, &kind.api_resource());

    drive(api, watcher::Config::default(), kind.to_string(), None, |change| {
        let ctx = ctx.clone();
        let adapter = adapter.clone();
        async move {
            match change {
                Change::Added(obj) => on_resource_added(&ctx, adapter.as_ref(), &obj).await,
                Change::Updated { old, new } => {
                    on_resource_updated(&ctx, adapter.as_ref(), &old, &new).await;
                }
                Change::Deleted(obj) => on_resource_deleted(&ctx, adapter.as_ref(), &obj).await,
            }
        }
    })
    .await
}

/// Run every watcher until one of them fails.
///
/// # Errors
///
/// Returns an error when any watch stream ends.
pub async fn run(
    client: Client,
    ctx: Arc<ReconcilerContext>,
    adapters: Vec<Arc<dyn ResourceAdapter>>,
) -> Result<()> {
    let (services_ready, services_seeded) = oneshot::channel();
    let (config_ready, config_seeded) = oneshot::channel();

    let services = watch_services(client.clone(), ctx.clone(), services_ready);
    let config = watch_config(client.clone(), ctx.clone(), config_ready);

    let resources = async {
        if services_seeded.await.is_err() || config_seeded.await.is_err() {
            bail!("Seed watchers stopped before their initial list completed");
        }
        info!(
            adapters = adapters.len(),
            "Address cache and published config seeded, starting resource watchers"
        );
        try_join_all(
            adapters
                .iter()
                .map(|adapter| watch_resources(client.clone(), ctx.clone(), adapter.clone())),
        )
        .await?;
        Ok::<(), anyhow::Error>(())
    };

    tokio::try_join!(services, config, resources)?;
    Ok(())
}

#[cfg(test)]
#[path = "watchers_tests.rs"]
mod watchers_tests;
