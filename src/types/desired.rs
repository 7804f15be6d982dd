// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fully resolved desired state of an EdgeLake node.
//!
//! Produced only by [`crate::defaults::resolve`]. Fields that have a default are
//! plain values here; the remaining `Option`s are settings with no default that
//! builders emit only when present. The serialized shape mirrors
//! [`EdgeLakeOperatorSpec`](super::edgelake::EdgeLakeOperatorSpec).

use super::edgelake::{GeolocationConfig, PullPolicy, SecretKeyRef, ServiceType};
use serde::Serialize;
use std::collections::BTreeMap;

/// Identity of the parent resource the desired state was resolved for
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub namespace: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesiredState {
    #[serde(skip)]
    pub identity: Identity,
    pub metadata: Metadata,
    pub image: Image,
    pub persistence: Persistence,
    pub resources: Resources,
    pub node_configs: NodeConfigs,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub hostname: String,
    pub app_name: String,
    pub service_name: String,
    pub config_map_name: String,
    pub deployment_name: String,
    pub node_selector: Option<BTreeMap<String, String>>,
    pub service_type: ServiceType,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub repository: String,
    pub tag: String,
    pub pull_policy: PullPolicy,
    pub secret_name: Option<String>,
}

impl Image {
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Persistence {
    pub enabled: bool,
    pub storage_class_name: Option<String>,
    pub access_mode: String,
    pub anylog: Volume,
    pub blockchain: Volume,
    pub data: Volume,
    pub scripts: Volume,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Volume {
    pub size: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Resources {
    pub requests: BTreeMap<String, String>,
    pub limits: BTreeMap<String, String>,
}

/// The four logical volumes of a node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeKind {
    Anylog,
    Blockchain,
    Data,
    Scripts,
}

impl VolumeKind {
    pub const ALL: [VolumeKind; 4] = [
        VolumeKind::Anylog,
        VolumeKind::Blockchain,
        VolumeKind::Data,
        VolumeKind::Scripts,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            VolumeKind::Anylog => "anylog",
            VolumeKind::Blockchain => "blockchain",
            VolumeKind::Data => "data",
            VolumeKind::Scripts => "scripts",
        }
    }
}

impl DesiredState {
    pub fn claim_name(&self, kind: VolumeKind) -> String {
        format!("{}-{}-pvc", self.metadata.app_name, kind.key())
    }

    pub fn volume_size(&self, kind: VolumeKind) -> &str {
        let volume = match kind {
            VolumeKind::Anylog => &self.persistence.anylog,
            VolumeKind::Blockchain => &self.persistence.blockchain,
            VolumeKind::Data => &self.persistence.data,
            VolumeKind::Scripts => &self.persistence.scripts,
        };
        &volume.size
    }

    /// Names of the claims this state asks for; empty when persistence is off
    pub fn claim_names(&self) -> Vec<String> {
        if !self.persistence.enabled {
            return Vec::new();
        }
        VolumeKind::ALL
            .iter()
            .map(|kind| self.claim_name(*kind))
            .collect()
    }

    /// Environment keys whose value is read from a Secret instead of the ConfigMap
    pub fn secret_env(&self) -> Vec<(&'static str, &SecretKeyRef)> {
        let nc = &self.node_configs;
        [
            ("LICENSE_KEY", &nc.general.license_key_secret_ref),
            ("DB_PASSWD", &nc.database.db_password_secret_ref),
            ("NOSQL_PASSWD", &nc.database.nosql_password_secret_ref),
            ("MQTT_PASSWD", &nc.mqtt.password_secret_ref),
        ]
        .into_iter()
        .filter_map(|(key, secret)| secret.as_ref().map(|secret| (key, secret)))
        .collect()
    }

    /// Cluster-internal DNS name of the node's service
    pub fn service_host(&self) -> String {
        format!(
            "{}.{}.svc.cluster.local",
            self.metadata.service_name, self.identity.namespace
        )
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfigs {
    pub directories: Directories,
    pub general: General,
    pub geolocation: GeolocationConfig,
    pub networking: Networking,
    pub database: Database,
    pub blockchain: Blockchain,
    pub operator: Operator,
    pub mqtt: Mqtt,
    pub opcua: Opcua,
    pub etherip: EtherIp,
    pub aggregations: Aggregations,
    pub monitoring: Monitoring,
    pub mcp: Mcp,
    pub advanced: Advanced,
    pub nebula: Nebula,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Directories {
    pub anylog_path: String,
    pub local_scripts: String,
    pub test_dir: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct General {
    pub license_key: Option<String>,
    pub license_key_secret_ref: Option<SecretKeyRef>,
    pub node_type: String,
    pub node_name: String,
    pub company_name: String,
    pub disable_cli: bool,
    pub remote_cli: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Networking {
    pub overlay_ip: Option<String>,
    pub server_port: i32,
    pub rest_port: i32,
    pub broker_port: Option<i32>,
    pub tcp_bind: bool,
    pub rest_bind: bool,
    pub broker_bind: bool,
    pub config_name: Option<String>,
    pub nic_type: Option<String>,
    pub tcp_threads: i32,
    pub rest_timeout: i32,
    pub rest_threads: i32,
    pub broker_threads: i32,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub db_type: String,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_password_secret_ref: Option<SecretKeyRef>,
    pub db_ip: String,
    pub db_port: i32,
    pub autocommit: bool,
    pub enable_nosql: bool,
    pub system_query: bool,
    pub memory: bool,
    pub nosql_type: String,
    pub nosql_user: Option<String>,
    pub nosql_password: Option<String>,
    pub nosql_password_secret_ref: Option<SecretKeyRef>,
    pub nosql_ip: String,
    pub nosql_port: i32,
    pub blobs_dbms: bool,
    pub blobs_reuse: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blockchain {
    pub ledger_conn: String,
    pub sync_time: String,
    pub blockchain_sync: String,
    pub blockchain_source: String,
    pub blockchain_destination: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub cluster_name: String,
    pub default_dbms: String,
    pub member: Option<String>,
    pub enable_ha: bool,
    pub start_date: i32,
    pub operator_threads: i32,
    pub enable_partitions: bool,
    pub table_name: String,
    pub partition_column: String,
    pub partition_interval: String,
    pub partition_keep: i32,
    pub partition_sync: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Mqtt {
    pub enabled: bool,
    pub broker: Option<String>,
    pub port: i32,
    pub user: Option<String>,
    pub password: Option<String>,
    pub password_secret_ref: Option<SecretKeyRef>,
    pub log: bool,
    pub msg_topic: Option<String>,
    pub msg_dbms: String,
    pub msg_table: String,
    pub msg_timestamp_column: String,
    pub msg_value_column: String,
    pub msg_value_column_type: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Opcua {
    pub enabled: bool,
    pub url: Option<String>,
    pub node: Option<String>,
    pub frequency: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EtherIp {
    pub enabled: bool,
    pub simulator_mode: bool,
    pub url: Option<String>,
    pub frequency: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Aggregations {
    pub enabled: bool,
    pub time_column: String,
    pub value_column: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Monitoring {
    pub monitor_nodes: bool,
    pub store_monitoring: bool,
    pub syslog_monitoring: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Mcp {
    pub autostart: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Advanced {
    pub deploy_local_script: bool,
    pub debug_mode: bool,
    pub compress_file: bool,
    pub query_pool: i32,
    pub write_immediate: bool,
    pub threshold_time: String,
    pub threshold_volume: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Nebula {
    pub enabled: bool,
    pub new_keys: bool,
    pub is_lighthouse: bool,
    pub cidr_overlay_address: Option<String>,
    pub lighthouse_ip: Option<String>,
    pub lighthouse_node_ip: Option<String>,
}
