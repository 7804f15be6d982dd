// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired state of an EdgeLake node. Every field is optional; unset fields are
/// filled in by [`crate::defaults::resolve`] before anything is built from them.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "edgelake.trv.io", version = "v1alpha1", kind = "EdgeLakeOperator")]
#[kube(namespaced, shortname = "elo")]
#[kube(status = "EdgeLakeOperatorStatus")]
#[kube(printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#)]
#[kube(printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#)]
#[kube(printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#)]
#[serde(rename_all = "camelCase")]
pub struct EdgeLakeOperatorSpec {
    /// Naming and scheduling of the generated Kubernetes objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence: Option<PersistenceSpec>,
    /// Compute resources for the EdgeLake container, as quantity strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesSpec>,
    /// EdgeLake node configuration, projected into the ConfigMap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_configs: Option<NodeConfigsSpec>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub enum ServiceType {
    #[serde(rename = "ClusterIP")]
    ClusterIp,
    NodePort,
    LoadBalancer,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ClusterIp => "ClusterIP",
            ServiceType::NodePort => "NodePort",
            ServiceType::LoadBalancer => "LoadBalancer",
        }
    }

    /// Whether the service type exposes ports on every node
    pub fn exposes_node_ports(&self) -> bool {
        matches!(self, ServiceType::NodePort | ServiceType::LoadBalancer)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub enum PullPolicy {
    Always,
    IfNotPresent,
    Never,
}

impl PullPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullPolicy::Always => "Always",
            PullPolicy::IfNotPresent => "IfNotPresent",
            PullPolicy::Never => "Never",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSpec {
    pub hostname: Option<String>,
    pub app_name: Option<String>,
    pub service_name: Option<String>,
    pub config_map_name: Option<String>,
    pub deployment_name: Option<String>,
    pub node_selector: Option<BTreeMap<String, String>>,
    pub service_type: Option<ServiceType>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    pub repository: Option<String>,
    pub tag: Option<String>,
    pub pull_policy: Option<PullPolicy>,
    /// Name of an image pull secret in the same namespace
    pub secret_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceSpec {
    pub enabled: Option<bool>,
    pub storage_class_name: Option<String>,
    pub access_mode: Option<String>,
    pub anylog: Option<VolumeSpec>,
    pub blockchain: Option<VolumeSpec>,
    pub data: Option<VolumeSpec>,
    pub scripts: Option<VolumeSpec>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct VolumeSpec {
    pub size: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct ResourcesSpec {
    pub requests: Option<BTreeMap<String, String>>,
    pub limits: Option<BTreeMap<String, String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfigsSpec {
    pub directories: Option<DirectoriesConfig>,
    pub general: Option<GeneralConfig>,
    pub geolocation: Option<GeolocationConfig>,
    pub networking: Option<NetworkingConfig>,
    pub database: Option<DatabaseConfig>,
    pub blockchain: Option<BlockchainConfig>,
    pub operator: Option<OperatorConfig>,
    pub mqtt: Option<MqttConfig>,
    pub opcua: Option<OpcuaConfig>,
    pub etherip: Option<EtherIpConfig>,
    pub aggregations: Option<AggregationsConfig>,
    pub monitoring: Option<MonitoringConfig>,
    pub mcp: Option<McpConfig>,
    pub advanced: Option<AdvancedConfig>,
    pub nebula: Option<NebulaConfig>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectoriesConfig {
    pub anylog_path: Option<String>,
    pub local_scripts: Option<String>,
    pub test_dir: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneralConfig {
    pub license_key: Option<String>,
    /// Takes precedence over `licenseKey`
    pub license_key_secret_ref: Option<SecretKeyRef>,
    /// One of master, operator or query
    pub node_type: Option<String>,
    pub node_name: Option<String>,
    pub company_name: Option<String>,
    pub disable_cli: Option<bool>,
    pub remote_cli: Option<bool>,
}

/// Key of an existing Secret in the parent's namespace
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct SecretKeyRef {
    pub name: String,
    pub key: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct GeolocationConfig {
    pub location: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkingConfig {
    pub overlay_ip: Option<String>,
    pub server_port: Option<i32>,
    pub rest_port: Option<i32>,
    pub broker_port: Option<i32>,
    pub tcp_bind: Option<bool>,
    pub rest_bind: Option<bool>,
    pub broker_bind: Option<bool>,
    pub config_name: Option<String>,
    pub nic_type: Option<String>,
    pub tcp_threads: Option<i32>,
    pub rest_timeout: Option<i32>,
    pub rest_threads: Option<i32>,
    pub broker_threads: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// sqlite or psql
    pub db_type: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_password_secret_ref: Option<SecretKeyRef>,
    pub db_ip: Option<String>,
    pub db_port: Option<i32>,
    pub autocommit: Option<bool>,
    pub enable_nosql: Option<bool>,
    pub system_query: Option<bool>,
    pub memory: Option<bool>,
    pub nosql_type: Option<String>,
    pub nosql_user: Option<String>,
    pub nosql_password: Option<String>,
    pub nosql_password_secret_ref: Option<SecretKeyRef>,
    pub nosql_ip: Option<String>,
    pub nosql_port: Option<i32>,
    pub blobs_dbms: Option<bool>,
    pub blobs_reuse: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainConfig {
    pub ledger_conn: Option<String>,
    pub sync_time: Option<String>,
    pub blockchain_sync: Option<String>,
    pub blockchain_source: Option<String>,
    pub blockchain_destination: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    pub cluster_name: Option<String>,
    pub default_dbms: Option<String>,
    pub member: Option<String>,
    pub enable_ha: Option<bool>,
    /// Days back to sync
    pub start_date: Option<i32>,
    pub operator_threads: Option<i32>,
    pub enable_partitions: Option<bool>,
    pub table_name: Option<String>,
    pub partition_column: Option<String>,
    pub partition_interval: Option<String>,
    pub partition_keep: Option<i32>,
    pub partition_sync: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MqttConfig {
    pub enabled: Option<bool>,
    pub broker: Option<String>,
    pub port: Option<i32>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub password_secret_ref: Option<SecretKeyRef>,
    pub log: Option<bool>,
    pub msg_topic: Option<String>,
    pub msg_dbms: Option<String>,
    pub msg_table: Option<String>,
    pub msg_timestamp_column: Option<String>,
    pub msg_value_column: Option<String>,
    pub msg_value_column_type: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct OpcuaConfig {
    pub enabled: Option<bool>,
    pub url: Option<String>,
    pub node: Option<String>,
    pub frequency: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtherIpConfig {
    pub enabled: Option<bool>,
    pub simulator_mode: Option<bool>,
    pub url: Option<String>,
    pub frequency: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregationsConfig {
    pub enabled: Option<bool>,
    pub time_column: Option<String>,
    pub value_column: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringConfig {
    pub monitor_nodes: Option<bool>,
    pub store_monitoring: Option<bool>,
    pub syslog_monitoring: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct McpConfig {
    pub autostart: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedConfig {
    pub deploy_local_script: Option<bool>,
    pub debug_mode: Option<bool>,
    pub compress_file: Option<bool>,
    pub query_pool: Option<i32>,
    pub write_immediate: Option<bool>,
    pub threshold_time: Option<String>,
    pub threshold_volume: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NebulaConfig {
    pub enabled: Option<bool>,
    pub new_keys: Option<bool>,
    pub is_lighthouse: Option<bool>,
    pub cidr_overlay_address: Option<String>,
    pub lighthouse_ip: Option<String>,
    pub lighthouse_node_ip: Option<String>,
}

/// Lifecycle phase, recomputed from observed facts on every reconcile
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub enum Phase {
    Pending,
    Creating,
    Running,
    Failed,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EdgeLakeOperatorStatus {
    pub phase: Option<Phase>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub ready: bool,
    pub observed_generation: Option<i64>,
    pub deployment_name: Option<String>,
    pub service_name: Option<String>,
    pub config_map_name: Option<String>,
    #[serde(default)]
    pub pvc_names: Vec<String>,
    pub endpoints: Option<Endpoints>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    /// "True" or "False"
    pub status: String,
    pub reason: String,
    pub message: String,
    /// RFC 3339 time of the last change of `status`
    pub last_transition_time: String,
}

/// In-cluster addresses of the node's listeners
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
pub struct Endpoints {
    pub tcp: String,
    pub rest: String,
    pub broker: Option<String>,
}

impl EdgeLakeOperatorStatus {
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::CustomResourceExt;

    #[test]
    fn test_spec_accepts_sparse_document() {
        let spec: EdgeLakeOperatorSpec = serde_json::from_value(serde_json::json!({
            "metadata": { "serviceType": "ClusterIP" },
            "nodeConfigs": { "networking": { "restPort": 32549 } }
        }))
        .unwrap();

        let metadata = spec.metadata.unwrap();
        assert_eq!(metadata.service_type, Some(ServiceType::ClusterIp));
        assert!(metadata.app_name.is_none());
        assert!(spec.image.is_none());
        let networking = spec.node_configs.unwrap().networking.unwrap();
        assert_eq!(networking.rest_port, Some(32549));
        assert_eq!(networking.server_port, None);
    }

    #[test]
    fn test_explicit_false_is_kept_apart_from_unset() {
        let spec: EdgeLakeOperatorSpec = serde_json::from_value(serde_json::json!({
            "persistence": { "enabled": false }
        }))
        .unwrap();

        assert_eq!(spec.persistence.unwrap().enabled, Some(false));
    }

    #[test]
    fn test_service_type_wire_names() {
        assert_eq!(
            serde_json::to_value(ServiceType::ClusterIp).unwrap(),
            serde_json::json!("ClusterIP")
        );
        assert_eq!(ServiceType::ClusterIp.as_str(), "ClusterIP");
        assert!(ServiceType::NodePort.exposes_node_ports());
        assert!(ServiceType::LoadBalancer.exposes_node_ports());
        assert!(!ServiceType::ClusterIp.exposes_node_ports());
    }

    #[test]
    fn test_status_condition_lookup() {
        let status = EdgeLakeOperatorStatus {
            conditions: vec![Condition {
                condition_type: "Ready".to_string(),
                status: "True".to_string(),
                reason: "DeploymentReady".to_string(),
                message: "ready".to_string(),
                last_transition_time: "2026-01-01T00:00:00Z".to_string(),
            }],
            ..Default::default()
        };

        assert_eq!(status.condition("Ready").unwrap().status, "True");
        assert!(status.condition("Degraded").is_none());
    }

    #[test]
    fn test_crd_identity() {
        let crd = EdgeLakeOperator::crd();
        assert_eq!(crd.spec.group, "edgelake.trv.io");
        assert_eq!(crd.spec.names.kind, "EdgeLakeOperator");
        assert_eq!(crd.spec.names.plural, "edgelakeoperators");
        assert_eq!(crd.spec.scope, "Namespaced");
    }
}
