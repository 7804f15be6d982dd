// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! EdgeLakeOperator reconciler - converges the node's ConfigMap, PVCs, Service and
//! Deployment and reports the Deployment's readiness back on the parent.

use crate::config::Config;
use crate::defaults;
use crate::error::{EdgeLakeError, Result};
use crate::kubernetes::converge::{create_or_update, ensure_created, owner_reference, Outcome};
use crate::kubernetes::finalizer::{add_finalizer, has_finalizer, remove_finalizer};
use crate::resources::{build_config_map, build_deployment, build_pvcs, build_service};
use crate::status;
use crate::types::{DesiredState, EdgeLakeOperator, EdgeLakeOperatorStatus, Identity};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{Patch, PatchParams},
    runtime::{controller::Action, Controller},
    Api, Client, Resource, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct EdgeLakeReconciler {
    client: Client,
    config: Config,
}

impl EdgeLakeReconciler {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    /// Api for `K` covering the watched namespace, or the whole cluster
    fn watched<K>(&self) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        match &self.config.watch_namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let parents = self.watched::<EdgeLakeOperator>();
        let config_maps = self.watched::<ConfigMap>();
        let claims = self.watched::<PersistentVolumeClaim>();
        let services = self.watched::<Service>();
        let deployments = self.watched::<Deployment>();
        let context = Arc::new(self);

        Controller::new(parents, WatcherConfig::default())
            .owns(config_maps, WatcherConfig::default())
            .owns(claims, WatcherConfig::default())
            .owns(services, WatcherConfig::default())
            .owns(deployments, WatcherConfig::default())
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled EdgeLakeOperator: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        info!("EdgeLakeOperator controller stopped");
        Ok(())
    }
}

#[instrument(
    skip_all,
    fields(namespace = %parent.namespace().unwrap_or_default(), name = %parent.name_any())
)]
async fn reconcile(parent: Arc<EdgeLakeOperator>, ctx: Arc<EdgeLakeReconciler>) -> Result<Action> {
    let namespace = parent
        .namespace()
        .ok_or(EdgeLakeError::MissingField("metadata.namespace"))?;
    let parents: Api<EdgeLakeOperator> = Api::namespaced(ctx.client.clone(), &namespace);

    if parent.meta().deletion_timestamp.is_some() {
        // Children carry owner references; garbage collection removes them
        if has_finalizer(&*parent) {
            info!("EdgeLakeOperator is being deleted, releasing finalizer");
            remove_finalizer(&parents, &*parent).await?;
        }
        return Ok(Action::await_change());
    }

    let mut parent = (*parent).clone();
    if !has_finalizer(&parent) {
        parent = add_finalizer(&parents, &parent).await?;
    }

    let state = defaults::resolve(
        &parent.spec,
        Identity {
            name: parent.name_any(),
            namespace: namespace.clone(),
        },
    );
    let generation = parent.meta().generation;
    let mut writer = StatusWriter::new(&parents, &parent);

    if writer.current().phase.is_none() {
        writer.write(status::pending()).await?;
    }
    if status::needs_creating_write(writer.current(), generation) {
        writer.write(status::creating(writer.current())).await?;
    }

    if let Err(err) = converge_children(&ctx.client, &parent, &state).await {
        error!("Failed to converge children: {}", err);
        let failed = status::failed(writer.current(), &err, &status::now());
        if let Err(write_err) = writer.write(failed).await {
            warn!("Failed to record Failed status: {}", write_err);
        }
        return Err(err);
    }

    let deployments: Api<Deployment> = Api::namespaced(ctx.client.clone(), &namespace);
    let live = deployments.get_opt(&state.metadata.deployment_name).await?;
    let next = status::project(
        writer.current(),
        live.as_ref(),
        generation,
        &state,
        &status::now(),
    );
    writer.write_if_changed(next).await?;

    Ok(Action::requeue(ctx.config.resync_interval))
}

/// ConfigMap, PVCs, Service, Deployment; the first error aborts the rest
async fn converge_children(
    client: &Client,
    parent: &EdgeLakeOperator,
    state: &DesiredState,
) -> Result<Vec<Outcome>> {
    let owner = owner_reference(parent)?;
    let namespace = &state.identity.namespace;
    let mut outcomes = Vec::new();

    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);
    outcomes.push(create_or_update(&config_maps, &owner, build_config_map(state)).await?);

    let claims: Api<PersistentVolumeClaim> = Api::namespaced(client.clone(), namespace);
    for claim in build_pvcs(state) {
        outcomes.push(ensure_created(&claims, &owner, claim).await?);
    }

    let services: Api<Service> = Api::namespaced(client.clone(), namespace);
    outcomes.push(create_or_update(&services, &owner, build_service(state)).await?);

    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    outcomes.push(create_or_update(&deployments, &owner, build_deployment(state)).await?);

    let changed = outcomes
        .iter()
        .filter(|outcome| **outcome != Outcome::Unchanged)
        .count();
    if changed > 0 {
        info!("Converged children, {} of {} written", changed, outcomes.len());
    } else {
        debug!("All {} children up to date", outcomes.len());
    }
    Ok(outcomes)
}

/// Writes the status subresource, guarding each write with the last seen resourceVersion
struct StatusWriter<'a> {
    api: &'a Api<EdgeLakeOperator>,
    name: String,
    resource_version: Option<String>,
    current: EdgeLakeOperatorStatus,
}

impl<'a> StatusWriter<'a> {
    fn new(api: &'a Api<EdgeLakeOperator>, parent: &EdgeLakeOperator) -> Self {
        Self {
            api,
            name: parent.name_any(),
            resource_version: parent.resource_version(),
            current: parent.status.clone().unwrap_or_default(),
        }
    }

    fn current(&self) -> &EdgeLakeOperatorStatus {
        &self.current
    }

    async fn write(&mut self, status: EdgeLakeOperatorStatus) -> Result<()> {
        let patch = json!({
            "metadata": { "resourceVersion": self.resource_version },
            "status": status,
        });
        let updated = self
            .api
            .patch_status(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        debug!("Status written with phase {:?}", status.phase);
        self.resource_version = updated.resource_version();
        self.current = status;
        Ok(())
    }

    async fn write_if_changed(&mut self, status: EdgeLakeOperatorStatus) -> Result<()> {
        if status == self.current {
            debug!("Status unchanged");
            return Ok(());
        }
        self.write(status).await
    }
}

fn error_policy(
    _parent: Arc<EdgeLakeOperator>,
    error: &EdgeLakeError,
    ctx: Arc<EdgeLakeReconciler>,
) -> Action {
    if error.is_conflict() {
        warn!("Conflict while reconciling, retrying: {}", error);
        return Action::requeue(ctx.config.conflict_requeue);
    }
    error!("Reconciliation error: {}", error);
    Action::requeue(ctx.config.error_requeue)
}
