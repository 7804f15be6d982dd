// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ConfigMap carrying the EdgeLake node configuration as environment variables

use super::child_meta;
use crate::types::DesiredState;
use k8s_openapi::api::core::v1::ConfigMap;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Number of hex characters of the data digest kept in the pod template annotation
const CONFIG_HASH_LEN: usize = 16;

pub fn build_config_map(state: &DesiredState) -> ConfigMap {
    ConfigMap {
        metadata: child_meta(state, &state.metadata.config_map_name),
        data: Some(config_data(state)),
        ..Default::default()
    }
}

/// Short digest of the rendered data. Changes whenever any key or value changes.
pub fn config_hash(data: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in data {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(CONFIG_HASH_LEN);
    digest
}

/// Render the node configuration into the environment keys the EdgeLake image reads
pub fn config_data(state: &DesiredState) -> BTreeMap<String, String> {
    let nc = &state.node_configs;
    let mut env = Env::default();

    env.set("IS_KUBERNETES", true);
    env.set("PROXY_IP", state.service_host());

    env.set("ANYLOG_PATH", &nc.directories.anylog_path);
    env.set("LOCAL_SCRIPTS", &nc.directories.local_scripts);
    env.set("TEST_DIR", &nc.directories.test_dir);

    let general = &nc.general;
    env.set_opt("LICENSE_KEY", &general.license_key);
    env.set("INIT_TYPE", "prod");
    env.set("NODE_TYPE", &general.node_type);
    env.set("NODE_NAME", &general.node_name);
    env.set("COMPANY_NAME", &general.company_name);
    env.set("DISABLE_CLI", general.disable_cli);
    env.set("REMOTE_CLI", general.remote_cli);

    let geo = &nc.geolocation;
    env.set_opt("LOCATION", &geo.location);
    env.set_opt("COUNTRY", &geo.country);
    env.set_opt("STATE", &geo.state);
    env.set_opt("CITY", &geo.city);

    let net = &nc.networking;
    env.set_opt("OVERLAY_IP", &net.overlay_ip);
    env.set("ANYLOG_SERVER_PORT", net.server_port);
    env.set("ANYLOG_REST_PORT", net.rest_port);
    env.set_opt("ANYLOG_BROKER_PORT", &net.broker_port);
    env.set("TCP_BIND", net.tcp_bind);
    env.set("REST_BIND", net.rest_bind);
    env.set("BROKER_BIND", net.broker_bind);
    env.set_opt("CONFIG_NAME", &net.config_name);
    env.set_opt("NIC_TYPE", &net.nic_type);
    env.set("TCP_THREADS", net.tcp_threads);
    env.set("REST_TIMEOUT", net.rest_timeout);
    env.set("REST_THREADS", net.rest_threads);
    env.set("BROKER_THREADS", net.broker_threads);

    let db = &nc.database;
    env.set("DB_TYPE", &db.db_type);
    env.set_opt("DB_USER", &db.db_user);
    env.set_opt("DB_PASSWD", &db.db_password);
    env.set("DB_IP", &db.db_ip);
    env.set("DB_PORT", db.db_port);
    env.set("AUTOCOMMIT", db.autocommit);
    env.set("ENABLE_NOSQL", db.enable_nosql);
    env.set("SYSTEM_QUERY", db.system_query);
    env.set("MEMORY", db.memory);
    env.set("NOSQL_TYPE", &db.nosql_type);
    env.set_opt("NOSQL_USER", &db.nosql_user);
    env.set_opt("NOSQL_PASSWD", &db.nosql_password);
    env.set("NOSQL_IP", &db.nosql_ip);
    env.set("NOSQL_PORT", db.nosql_port);
    env.set("BLOBS_DBMS", db.blobs_dbms);
    env.set("BLOBS_REUSE", db.blobs_reuse);

    let chain = &nc.blockchain;
    env.set("LEDGER_CONN", &chain.ledger_conn);
    env.set("SYNC_TIME", &chain.sync_time);
    env.set("BLOCKCHAIN_SYNC", &chain.blockchain_sync);
    env.set("BLOCKCHAIN_SOURCE", &chain.blockchain_source);
    env.set("BLOCKCHAIN_DESTINATION", &chain.blockchain_destination);

    let op = &nc.operator;
    env.set("CLUSTER_NAME", &op.cluster_name);
    env.set("DEFAULT_DBMS", &op.default_dbms);
    env.set_opt("MEMBER", &op.member);
    env.set("ENABLE_HA", op.enable_ha);
    env.set("START_DATE", op.start_date);
    env.set("OPERATOR_THREADS", op.operator_threads);
    env.set("ENABLE_PARTITIONS", op.enable_partitions);
    env.set("TABLE_NAME", &op.table_name);
    env.set("PARTITION_COLUMN", &op.partition_column);
    env.set("PARTITION_INTERVAL", &op.partition_interval);
    env.set("PARTITION_KEEP", op.partition_keep);
    env.set("PARTITION_SYNC", &op.partition_sync);

    let mqtt = &nc.mqtt;
    env.set("ENABLE_MQTT", mqtt.enabled);
    env.set_opt("MQTT_BROKER", &mqtt.broker);
    env.set("MQTT_PORT", mqtt.port);
    env.set_opt("MQTT_USER", &mqtt.user);
    env.set_opt("MQTT_PASSWD", &mqtt.password);
    env.set("MQTT_LOG", mqtt.log);
    env.set_opt("MSG_TOPIC", &mqtt.msg_topic);
    env.set("MSG_DBMS", &mqtt.msg_dbms);
    env.set("MSG_TABLE", &mqtt.msg_table);
    env.set("MSG_TIMESTAMP_COLUMN", &mqtt.msg_timestamp_column);
    env.set("MSG_VALUE_COLUMN", &mqtt.msg_value_column);
    env.set("MSG_VALUE_COLUMN_TYPE", &mqtt.msg_value_column_type);

    env.set("ENABLE_OPCUA", nc.opcua.enabled);
    env.set_opt("OPCUA_URL", &nc.opcua.url);
    env.set_opt("OPCUA_NODE", &nc.opcua.node);
    env.set_opt("OPCUA_FREQUENCY", &nc.opcua.frequency);

    env.set("ENABLE_ETHERIP", nc.etherip.enabled);
    env.set("SIMULATOR_MODE", nc.etherip.simulator_mode);
    env.set_opt("ETHERIP_URL", &nc.etherip.url);
    env.set_opt("ETHERIP_FREQUENCY", &nc.etherip.frequency);

    env.set("ENABLE_AGGREGATIONS", nc.aggregations.enabled);
    env.set("AGGREGATION_TIME_COLUMN", &nc.aggregations.time_column);
    env.set("AGGREGATION_VALUE_COLUMN", &nc.aggregations.value_column);

    env.set("MONITOR_NODES", nc.monitoring.monitor_nodes);
    env.set("STORE_MONITORING", nc.monitoring.store_monitoring);
    env.set("SYSLOG_MONITORING", nc.monitoring.syslog_monitoring);

    env.set("MCP_AUTOSTART", nc.mcp.autostart);

    let adv = &nc.advanced;
    env.set("DEPLOY_LOCAL_SCRIPT", adv.deploy_local_script);
    env.set("DEBUG_MODE", adv.debug_mode);
    env.set("COMPRESS_FILE", adv.compress_file);
    env.set("QUERY_POOL", adv.query_pool);
    env.set("WRITE_IMMEDIATE", adv.write_immediate);
    env.set("THRESHOLD_TIME", &adv.threshold_time);
    env.set("THRESHOLD_VOLUME", &adv.threshold_volume);

    let nebula = &nc.nebula;
    env.set("ENABLE_NEBULA", nebula.enabled);
    env.set("NEBULA_NEW_KEYS", nebula.new_keys);
    env.set("IS_LIGHTHOUSE", nebula.is_lighthouse);
    env.set_opt("CIDR_OVERLAY_ADDRESS", &nebula.cidr_overlay_address);
    env.set_opt("LIGHTHOUSE_IP", &nebula.lighthouse_ip);
    env.set_opt("LIGHTHOUSE_NODE_IP", &nebula.lighthouse_node_ip);

    // Secret-backed values reach the container through env, never through the ConfigMap
    for (key, _) in state.secret_env() {
        env.0.remove(key);
    }

    env.0
}

#[derive(Default)]
struct Env(BTreeMap<String, String>);

impl Env {
    fn set(&mut self, key: &str, value: impl ToString) {
        self.0.insert(key.to_string(), value.to_string());
    }

    /// Settings without a default are left out entirely when unset
    fn set_opt<T: ToString>(&mut self, key: &str, value: &Option<T>) {
        if let Some(value) = value {
            self.0.insert(key.to_string(), value.to_string());
        }
    }
}
