// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Defaulting of the EdgeLakeOperator spec.
//!
//! [`resolve`] is a pure, total transform: it never fails and never touches the
//! store. Presence rules: empty strings and non-positive numbers count as unset,
//! an explicit `false` is kept, and explicitly empty resource maps are kept.

use crate::types::desired::*;
use crate::types::edgelake::{
    EdgeLakeOperatorSpec, NodeConfigsSpec, PullPolicy, SecretKeyRef, ServiceType, VolumeSpec,
};
use std::collections::BTreeMap;

const DEFAULT_HOSTNAME: &str = "edgelake-operator";
const DEFAULT_IMAGE_REPOSITORY: &str = "anylogco/edgelake-network";
const DEFAULT_IMAGE_TAG: &str = "1.3.2500";
const DEFAULT_ACCESS_MODE: &str = "ReadWriteOnce";

const DEFAULT_SERVER_PORT: i32 = 32148;
const DEFAULT_REST_PORT: i32 = 32149;

/// Resolve a possibly sparse spec into the complete desired state for `identity`.
pub fn resolve(spec: &EdgeLakeOperatorSpec, identity: Identity) -> DesiredState {
    let metadata = resolve_metadata(spec, &identity);
    let node_configs = resolve_node_configs(
        spec.node_configs.clone().unwrap_or_default(),
        &metadata.app_name,
    );

    DesiredState {
        image: resolve_image(spec),
        persistence: resolve_persistence(spec),
        resources: resolve_resources(spec),
        metadata,
        node_configs,
        identity,
    }
}

fn text(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn optional(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

/// A reference missing either its name or its key is treated as unset
fn secret_ref(value: &Option<SecretKeyRef>) -> Option<SecretKeyRef> {
    value
        .clone()
        .filter(|secret| !secret.name.is_empty() && !secret.key.is_empty())
}

fn count(value: Option<i32>, default: i32) -> i32 {
    value.filter(|v| *v > 0).unwrap_or(default)
}

fn resolve_metadata(spec: &EdgeLakeOperatorSpec, identity: &Identity) -> Metadata {
    let m = spec.metadata.clone().unwrap_or_default();
    let name = &identity.name;
    let app_name = text(&m.app_name, name);

    Metadata {
        hostname: text(&m.hostname, DEFAULT_HOSTNAME),
        service_name: text(&m.service_name, &format!("{}-service", name)),
        config_map_name: text(&m.config_map_name, &format!("{}-configmap", name)),
        deployment_name: text(&m.deployment_name, &format!("{}-deployment", app_name)),
        node_selector: m.node_selector,
        service_type: m.service_type.unwrap_or(ServiceType::NodePort),
        app_name,
    }
}

fn resolve_image(spec: &EdgeLakeOperatorSpec) -> Image {
    let i = spec.image.clone().unwrap_or_default();
    Image {
        repository: text(&i.repository, DEFAULT_IMAGE_REPOSITORY),
        tag: text(&i.tag, DEFAULT_IMAGE_TAG),
        pull_policy: i.pull_policy.unwrap_or(PullPolicy::IfNotPresent),
        secret_name: optional(&i.secret_name),
    }
}

fn resolve_persistence(spec: &EdgeLakeOperatorSpec) -> Persistence {
    let p = spec.persistence.clone().unwrap_or_default();
    let volume = |v: &Option<VolumeSpec>, default: &str| Volume {
        size: text(&v.as_ref().and_then(|v| v.size.clone()), default),
    };

    Persistence {
        enabled: p.enabled.unwrap_or(true),
        storage_class_name: optional(&p.storage_class_name),
        access_mode: text(&p.access_mode, DEFAULT_ACCESS_MODE),
        anylog: volume(&p.anylog, "5Gi"),
        blockchain: volume(&p.blockchain, "1Gi"),
        data: volume(&p.data, "10Gi"),
        scripts: volume(&p.scripts, "1Gi"),
    }
}

fn resolve_resources(spec: &EdgeLakeOperatorSpec) -> Resources {
    let r = spec.resources.clone().unwrap_or_default();
    let quantities = |pairs: [(&str, &str); 2]| -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    };

    Resources {
        requests: r
            .requests
            .unwrap_or_else(|| quantities([("cpu", "500m"), ("memory", "1Gi")])),
        limits: r
            .limits
            .unwrap_or_else(|| quantities([("cpu", "2000m"), ("memory", "4Gi")])),
    }
}

fn resolve_node_configs(nc: NodeConfigsSpec, app_name: &str) -> NodeConfigs {
    let d = nc.directories.unwrap_or_default();
    let g = nc.general.unwrap_or_default();
    let geo = nc.geolocation.unwrap_or_default();
    let n = nc.networking.unwrap_or_default();
    let db = nc.database.unwrap_or_default();
    let bc = nc.blockchain.unwrap_or_default();
    let op = nc.operator.unwrap_or_default();
    let mq = nc.mqtt.unwrap_or_default();
    let ua = nc.opcua.unwrap_or_default();
    let eip = nc.etherip.unwrap_or_default();
    let agg = nc.aggregations.unwrap_or_default();
    let mon = nc.monitoring.unwrap_or_default();
    let mcp = nc.mcp.unwrap_or_default();
    let adv = nc.advanced.unwrap_or_default();
    let neb = nc.nebula.unwrap_or_default();

    NodeConfigs {
        directories: Directories {
            anylog_path: text(&d.anylog_path, "/app"),
            local_scripts: text(&d.local_scripts, "/app/deployment-scripts/node-deployment"),
            test_dir: text(&d.test_dir, "/app/deployment-scripts/tests"),
        },
        general: General {
            license_key: optional(&g.license_key),
            license_key_secret_ref: secret_ref(&g.license_key_secret_ref),
            node_type: text(&g.node_type, "operator"),
            node_name: text(&g.node_name, app_name),
            company_name: text(&g.company_name, "New Company"),
            disable_cli: g.disable_cli.unwrap_or(false),
            remote_cli: g.remote_cli.unwrap_or(false),
        },
        geolocation: crate::types::edgelake::GeolocationConfig {
            location: optional(&geo.location),
            country: optional(&geo.country),
            state: optional(&geo.state),
            city: optional(&geo.city),
        },
        networking: Networking {
            overlay_ip: optional(&n.overlay_ip),
            server_port: count(n.server_port, DEFAULT_SERVER_PORT),
            rest_port: count(n.rest_port, DEFAULT_REST_PORT),
            broker_port: n.broker_port.filter(|p| *p > 0),
            tcp_bind: n.tcp_bind.unwrap_or(false),
            rest_bind: n.rest_bind.unwrap_or(false),
            broker_bind: n.broker_bind.unwrap_or(false),
            config_name: optional(&n.config_name),
            nic_type: optional(&n.nic_type),
            tcp_threads: count(n.tcp_threads, 6),
            rest_timeout: count(n.rest_timeout, 30),
            rest_threads: count(n.rest_threads, 6),
            broker_threads: count(n.broker_threads, 6),
        },
        database: Database {
            db_type: text(&db.db_type, "sqlite"),
            db_user: optional(&db.db_user),
            db_password: optional(&db.db_password),
            db_password_secret_ref: secret_ref(&db.db_password_secret_ref),
            db_ip: text(&db.db_ip, "127.0.0.1"),
            db_port: count(db.db_port, 5432),
            autocommit: db.autocommit.unwrap_or(false),
            enable_nosql: db.enable_nosql.unwrap_or(false),
            system_query: db.system_query.unwrap_or(false),
            memory: db.memory.unwrap_or(false),
            nosql_type: text(&db.nosql_type, "mongo"),
            nosql_user: optional(&db.nosql_user),
            nosql_password: optional(&db.nosql_password),
            nosql_password_secret_ref: secret_ref(&db.nosql_password_secret_ref),
            nosql_ip: text(&db.nosql_ip, "127.0.0.1"),
            nosql_port: count(db.nosql_port, 27017),
            blobs_dbms: db.blobs_dbms.unwrap_or(false),
            blobs_reuse: db.blobs_reuse.unwrap_or(true),
        },
        blockchain: Blockchain {
            ledger_conn: text(&bc.ledger_conn, "127.0.0.1:32048"),
            sync_time: text(&bc.sync_time, "30 second"),
            blockchain_sync: text(&bc.blockchain_sync, "30 second"),
            blockchain_source: text(&bc.blockchain_source, "master"),
            blockchain_destination: text(&bc.blockchain_destination, "file"),
        },
        operator: Operator {
            cluster_name: text(&op.cluster_name, "new-company-cluster1"),
            default_dbms: text(&op.default_dbms, "new_company"),
            member: optional(&op.member),
            enable_ha: op.enable_ha.unwrap_or(false),
            start_date: count(op.start_date, 30),
            operator_threads: count(op.operator_threads, 3),
            enable_partitions: op.enable_partitions.unwrap_or(true),
            table_name: text(&op.table_name, "*"),
            partition_column: text(&op.partition_column, "insert_timestamp"),
            partition_interval: text(&op.partition_interval, "14 days"),
            partition_keep: count(op.partition_keep, 3),
            partition_sync: text(&op.partition_sync, "1 day"),
        },
        mqtt: Mqtt {
            enabled: mq.enabled.unwrap_or(false),
            broker: optional(&mq.broker),
            port: count(mq.port, 1883),
            user: optional(&mq.user),
            password: optional(&mq.password),
            password_secret_ref: secret_ref(&mq.password_secret_ref),
            log: mq.log.unwrap_or(false),
            msg_topic: optional(&mq.msg_topic),
            msg_dbms: text(&mq.msg_dbms, "new_company"),
            msg_table: text(&mq.msg_table, "bring [table]"),
            msg_timestamp_column: text(&mq.msg_timestamp_column, "bring [timestamp]"),
            msg_value_column: text(&mq.msg_value_column, "bring [value]"),
            msg_value_column_type: text(&mq.msg_value_column_type, "float"),
        },
        opcua: Opcua {
            enabled: ua.enabled.unwrap_or(false),
            url: optional(&ua.url),
            node: optional(&ua.node),
            frequency: optional(&ua.frequency),
        },
        etherip: EtherIp {
            enabled: eip.enabled.unwrap_or(false),
            simulator_mode: eip.simulator_mode.unwrap_or(false),
            url: optional(&eip.url),
            frequency: optional(&eip.frequency),
        },
        aggregations: Aggregations {
            enabled: agg.enabled.unwrap_or(false),
            time_column: text(&agg.time_column, "insert_timestamp"),
            value_column: text(&agg.value_column, "value"),
        },
        monitoring: Monitoring {
            monitor_nodes: mon.monitor_nodes.unwrap_or(false),
            store_monitoring: mon.store_monitoring.unwrap_or(false),
            syslog_monitoring: mon.syslog_monitoring.unwrap_or(false),
        },
        mcp: Mcp {
            autostart: mcp.autostart.unwrap_or(false),
        },
        advanced: Advanced {
            deploy_local_script: adv.deploy_local_script.unwrap_or(false),
            debug_mode: adv.debug_mode.unwrap_or(false),
            compress_file: adv.compress_file.unwrap_or(true),
            query_pool: count(adv.query_pool, 6),
            write_immediate: adv.write_immediate.unwrap_or(false),
            threshold_time: text(&adv.threshold_time, "60 seconds"),
            threshold_volume: text(&adv.threshold_volume, "100KB"),
        },
        nebula: Nebula {
            enabled: neb.enabled.unwrap_or(false),
            new_keys: neb.new_keys.unwrap_or(false),
            is_lighthouse: neb.is_lighthouse.unwrap_or(false),
            cidr_overlay_address: optional(&neb.cidr_overlay_address),
            lighthouse_ip: optional(&neb.lighthouse_ip),
            lighthouse_node_ip: optional(&neb.lighthouse_node_ip),
        },
    }
}
