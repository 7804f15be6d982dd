// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create-or-update of owned child objects.
//!
//! A child that does not exist is created verbatim. An existing child keeps every
//! field we do not own (cluster IP, server-side defaults, foreign annotations); only
//! the fields named by [`OwnedFields`] are copied over, and the write is a `replace`
//! carrying the fetched resourceVersion so a concurrent writer surfaces as a 409.

use crate::error::{EdgeLakeError, Result};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{debug, info, instrument};

/// Fields of a child object that the operator owns and overwrites on update
pub trait OwnedFields {
    fn copy_owned_fields(&mut self, desired: &Self);
}

impl OwnedFields for ConfigMap {
    fn copy_owned_fields(&mut self, desired: &Self) {
        self.data = desired.data.clone();
        self.metadata.labels = desired.metadata.labels.clone();
    }
}

impl OwnedFields for Service {
    fn copy_owned_fields(&mut self, desired: &Self) {
        let wanted = desired.spec.clone().unwrap_or_default();
        let spec = self.spec.get_or_insert_with(ServiceSpec::default);
        spec.ports = wanted.ports;
        spec.type_ = wanted.type_;
        spec.selector = wanted.selector;
    }
}

/// The whole spec is owned. Fields the API server defaults (strategy, revision history)
/// are absent from the desired spec, so against a real server this replaces with
/// identical content on every pass.
impl OwnedFields for Deployment {
    fn copy_owned_fields(&mut self, desired: &Self) {
        self.spec = desired.spec.clone();
        self.metadata.labels = desired.metadata.labels.clone();
    }
}

/// What a convergence step did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
}

/// Controller owner reference pointing at `parent`
pub fn owner_reference<P>(parent: &P) -> Result<OwnerReference>
where
    P: Resource<DynamicType = ()>,
{
    parent
        .controller_owner_ref(&())
        .ok_or(EdgeLakeError::MissingField("metadata.uid"))
}

fn ensure_owner(meta: &mut ObjectMeta, owner: &OwnerReference) {
    let refs = meta.owner_references.get_or_insert_with(Vec::new);
    if !refs.iter().any(|r| r.uid == owner.uid) {
        refs.push(owner.clone());
    }
}

/// Bring the child named by `desired` in line with it
#[instrument(skip_all, fields(kind = %K::kind(&()), name = %desired.name_any()))]
pub async fn create_or_update<K>(
    api: &Api<K>,
    owner: &OwnerReference,
    mut desired: K,
) -> Result<Outcome>
where
    K: Resource<DynamicType = ()> + OwnedFields + Clone + Debug + PartialEq,
    K: Serialize + DeserializeOwned,
{
    let name = desired.name_any();
    ensure_owner(desired.meta_mut(), owner);

    let Some(live) = api.get_opt(&name).await? else {
        info!("Creating {} {}", K::kind(&()), name);
        api.create(&PostParams::default(), &desired).await?;
        return Ok(Outcome::Created);
    };

    let mut merged = live.clone();
    merged.copy_owned_fields(&desired);
    ensure_owner(merged.meta_mut(), owner);

    if merged == live {
        debug!("{} {} is up to date", K::kind(&()), name);
        return Ok(Outcome::Unchanged);
    }

    info!("Updating {} {}", K::kind(&()), name);
    api.replace(&name, &PostParams::default(), &merged).await?;
    Ok(Outcome::Updated)
}

/// Create the child if absent; an existing object is never modified
#[instrument(skip_all, fields(kind = %K::kind(&()), name = %desired.name_any()))]
pub async fn ensure_created<K>(
    api: &Api<K>,
    owner: &OwnerReference,
    mut desired: K,
) -> Result<Outcome>
where
    K: Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned,
{
    let name = desired.name_any();

    if api.get_opt(&name).await?.is_some() {
        debug!("{} {} already exists", K::kind(&()), name);
        return Ok(Outcome::Unchanged);
    }

    ensure_owner(desired.meta_mut(), owner);
    info!("Creating {} {}", K::kind(&()), name);
    api.create(&PostParams::default(), &desired).await?;
    Ok(Outcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeApiServer;
    use k8s_openapi::api::core::v1::{PersistentVolumeClaim, ServicePort};
    use std::collections::BTreeMap;

    fn make_owner() -> OwnerReference {
        OwnerReference {
            api_version: "edgelake.trv.io/v1alpha1".to_string(),
            kind: "EdgeLakeOperator".to_string(),
            name: "node1".to_string(),
            uid: "parent-uid".to_string(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    fn make_config_map(value: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some("node1-configmap".to_string()),
                namespace: Some("edge".to_string()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([("NODE_TYPE".to_string(), value.to_string())])),
            ..Default::default()
        }
    }

    fn make_service(port: i32) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some("node1-service".to_string()),
                namespace: Some("edge".to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some("NodePort".to_string()),
                ports: Some(vec![ServicePort {
                    name: Some("rest-api".to_string()),
                    port,
                    node_port: Some(port),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_unchanged() {
        let server = FakeApiServer::new();
        let api: Api<ConfigMap> = Api::namespaced(server.client(), "edge");

        let first = create_or_update(&api, &make_owner(), make_config_map("operator"))
            .await
            .unwrap();
        let second = create_or_update(&api, &make_owner(), make_config_map("operator"))
            .await
            .unwrap();

        assert_eq!(first, Outcome::Created);
        assert_eq!(second, Outcome::Unchanged);
        assert_eq!(server.writes().len(), 1);

        let stored = api.get("node1-configmap").await.unwrap();
        assert_eq!(stored.owner_references()[0].uid, "parent-uid");
    }

    #[tokio::test]
    async fn test_update_copies_owned_fields() {
        let server = FakeApiServer::new();
        let api: Api<ConfigMap> = Api::namespaced(server.client(), "edge");
        create_or_update(&api, &make_owner(), make_config_map("operator"))
            .await
            .unwrap();

        let outcome = create_or_update(&api, &make_owner(), make_config_map("query"))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Updated);
        let stored = api.get("node1-configmap").await.unwrap();
        assert_eq!(stored.data.unwrap()["NODE_TYPE"], "query");
        assert_eq!(server.writes()[1].0, "PUT");
    }

    #[tokio::test]
    async fn test_service_update_keeps_cluster_ip() {
        let server = FakeApiServer::new();
        let mut existing = make_service(32149);
        existing.spec.as_mut().unwrap().cluster_ip = Some("10.43.0.12".to_string());
        server.insert("services", serde_json::to_value(&existing).unwrap());
        let api: Api<Service> = Api::namespaced(server.client(), "edge");

        let outcome = create_or_update(&api, &make_owner(), make_service(32549))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Updated);
        let spec = api.get("node1-service").await.unwrap().spec.unwrap();
        assert_eq!(spec.cluster_ip.as_deref(), Some("10.43.0.12"));
        assert_eq!(spec.ports.unwrap()[0].port, 32549);
    }

    #[tokio::test]
    async fn test_existing_claim_is_never_touched() {
        let server = FakeApiServer::new();
        let claim = |size: &str| PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some("node1-data-pvc".to_string()),
                namespace: Some("edge".to_string()),
                labels: Some(BTreeMap::from([("size".to_string(), size.to_string())])),
                ..Default::default()
            },
            ..Default::default()
        };
        let api: Api<PersistentVolumeClaim> = Api::namespaced(server.client(), "edge");

        let first = ensure_created(&api, &make_owner(), claim("10Gi")).await.unwrap();
        let second = ensure_created(&api, &make_owner(), claim("20Gi")).await.unwrap();

        assert_eq!(first, Outcome::Created);
        assert_eq!(second, Outcome::Unchanged);
        assert_eq!(server.writes().len(), 1);
        let stored = api.get("node1-data-pvc").await.unwrap();
        assert_eq!(stored.labels()["size"], "10Gi");
    }

    #[tokio::test]
    async fn test_conflict_surfaces() {
        let server = FakeApiServer::new();
        let api: Api<ConfigMap> = Api::namespaced(server.client(), "edge");
        create_or_update(&api, &make_owner(), make_config_map("operator"))
            .await
            .unwrap();
        server.fail("PUT", "configmaps", 409);

        let err = create_or_update(&api, &make_owner(), make_config_map("query"))
            .await
            .unwrap_err();

        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_deployment_with_server_defaults_is_replaced() {
        use k8s_openapi::api::apps::v1::DeploymentSpec;

        let server = FakeApiServer::new();
        let api: Api<Deployment> = Api::namespaced(server.client(), "edge");
        let desired = Deployment {
            metadata: ObjectMeta {
                name: Some("node1-deployment".to_string()),
                namespace: Some("edge".to_string()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(1),
                ..Default::default()
            }),
            ..Default::default()
        };
        create_or_update(&api, &make_owner(), desired.clone())
            .await
            .unwrap();
        let mut live = server.get("deployments", "edge", "node1-deployment").unwrap();
        live["spec"]["revisionHistoryLimit"] = serde_json::json!(10);
        server.insert("deployments", live);

        let outcome = create_or_update(&api, &make_owner(), desired).await.unwrap();

        assert_eq!(outcome, Outcome::Updated);
        let spec = api.get("node1-deployment").await.unwrap().spec.unwrap();
        assert_eq!(spec.replicas, Some(1));
        assert_eq!(spec.revision_history_limit, None);
    }

    #[test]
    fn test_owner_is_added_once() {
        let mut meta = ObjectMeta::default();
        ensure_owner(&mut meta, &make_owner());
        ensure_owner(&mut meta, &make_owner());

        assert_eq!(meta.owner_references.unwrap().len(), 1);
    }
}
