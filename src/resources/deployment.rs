// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Single-replica Deployment running the EdgeLake node container

use super::configmap::{config_data, config_hash};
use super::labels::selector_labels;
use super::service::named_ports;
use super::child_meta;
use crate::constants::annotations;
use crate::types::{DesiredState, VolumeKind};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapEnvSource, Container, ContainerPort, EmptyDirVolumeSource, EnvFromSource, EnvVar,
    EnvVarSource, LocalObjectReference, PersistentVolumeClaimVolumeSource, PodSpec,
    PodTemplateSpec, Probe, ResourceRequirements, SecretKeySelector, TCPSocketAction, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

pub fn build_deployment(state: &DesiredState) -> Deployment {
    let selector = selector_labels(state);
    let hash = config_hash(&config_data(state));

    Deployment {
        metadata: child_meta(state, &state.metadata.deployment_name),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(selector.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector),
                    annotations: Some(BTreeMap::from([(
                        annotations::CONFIG_HASH.to_string(),
                        hash,
                    )])),
                    ..Default::default()
                }),
                spec: Some(pod_spec(state)),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn pod_spec(state: &DesiredState) -> PodSpec {
    PodSpec {
        containers: vec![container(state)],
        volumes: Some(volumes(state)),
        node_selector: state
            .metadata
            .node_selector
            .clone()
            .filter(|selector| !selector.is_empty()),
        image_pull_secrets: state.image.secret_name.as_ref().map(|secret| {
            vec![LocalObjectReference {
                name: secret.clone().into(),
            }]
        }),
        ..Default::default()
    }
}

fn container(state: &DesiredState) -> Container {
    let rest_port = state.node_configs.networking.rest_port;

    Container {
        name: format!("{}-container", state.metadata.hostname),
        image: Some(state.image.reference()),
        image_pull_policy: Some(state.image.pull_policy.as_str().to_string()),
        ports: Some(
            named_ports(state)
                .into_iter()
                .map(|(name, port)| ContainerPort {
                    name: Some(name.to_string()),
                    container_port: port,
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                })
                .collect(),
        ),
        env_from: Some(vec![EnvFromSource {
            config_map_ref: Some(ConfigMapEnvSource {
                name: state.metadata.config_map_name.clone().into(),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        env: secret_env(state),
        tty: Some(true),
        stdin: Some(true),
        volume_mounts: Some(
            VolumeKind::ALL
                .iter()
                .map(|kind| VolumeMount {
                    name: volume_name(*kind),
                    mount_path: mount_path(*kind).to_string(),
                    ..Default::default()
                })
                .collect(),
        ),
        liveness_probe: Some(tcp_probe(rest_port, 60, 30)),
        readiness_probe: Some(tcp_probe(rest_port, 30, 10)),
        resources: Some(ResourceRequirements {
            requests: quantities(&state.resources.requests),
            limits: quantities(&state.resources.limits),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn secret_env(state: &DesiredState) -> Option<Vec<EnvVar>> {
    let env: Vec<EnvVar> = state
        .secret_env()
        .into_iter()
        .map(|(key, secret)| EnvVar {
            name: key.to_string(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: secret.name.clone().into(),
                    key: secret.key.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect();

    (!env.is_empty()).then_some(env)
}

fn tcp_probe(port: i32, initial_delay: i32, period: i32) -> Probe {
    Probe {
        tcp_socket: Some(TCPSocketAction {
            port: IntOrString::Int(port),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay),
        period_seconds: Some(period),
        timeout_seconds: Some(5),
        failure_threshold: Some(3),
        ..Default::default()
    }
}

/// An empty map means "no constraint" and is left out of the manifest
fn quantities(values: &BTreeMap<String, String>) -> Option<BTreeMap<String, Quantity>> {
    if values.is_empty() {
        return None;
    }
    Some(
        values
            .iter()
            .map(|(k, v)| (k.clone(), Quantity(v.clone())))
            .collect(),
    )
}

fn volumes(state: &DesiredState) -> Vec<Volume> {
    VolumeKind::ALL
        .iter()
        .map(|kind| {
            let mut volume = Volume {
                name: volume_name(*kind),
                ..Default::default()
            };
            if state.persistence.enabled {
                volume.persistent_volume_claim = Some(PersistentVolumeClaimVolumeSource {
                    claim_name: state.claim_name(*kind),
                    ..Default::default()
                });
            } else {
                volume.empty_dir = Some(EmptyDirVolumeSource::default());
            }
            volume
        })
        .collect()
}

fn volume_name(kind: VolumeKind) -> String {
    format!("{}-volume", kind.key())
}

fn mount_path(kind: VolumeKind) -> &'static str {
    match kind {
        VolumeKind::Anylog => "/app/EdgeLake/anylog",
        VolumeKind::Blockchain => "/app/EdgeLake/blockchain",
        VolumeKind::Data => "/app/EdgeLake/data",
        VolumeKind::Scripts => "/app/deployment-scripts",
    }
}
