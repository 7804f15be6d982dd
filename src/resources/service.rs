// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::{child_meta, labels::selector_labels};
use crate::types::DesiredState;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

pub const PORT_TCP: &str = "tcp-server";
pub const PORT_REST: &str = "rest-api";
pub const PORT_BROKER: &str = "mqtt-broker";

/// Service exposing the node's TCP, REST and (when configured) broker listeners
pub fn build_service(state: &DesiredState) -> Service {
    Service {
        metadata: child_meta(state, &state.metadata.service_name),
        spec: Some(ServiceSpec {
            type_: Some(state.metadata.service_type.as_str().to_string()),
            selector: Some(selector_labels(state)),
            ports: Some(service_ports(state)),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Named ports of the node, in declaration order
pub(crate) fn named_ports(state: &DesiredState) -> Vec<(&'static str, i32)> {
    let net = &state.node_configs.networking;
    let mut ports = vec![(PORT_TCP, net.server_port), (PORT_REST, net.rest_port)];
    if let Some(broker) = net.broker_port {
        ports.push((PORT_BROKER, broker));
    }
    ports
}

fn service_ports(state: &DesiredState) -> Vec<ServicePort> {
    let node_ports = state.metadata.service_type.exposes_node_ports();

    named_ports(state)
        .into_iter()
        .map(|(name, port)| ServicePort {
            name: Some(name.to_string()),
            protocol: Some("TCP".to_string()),
            port,
            target_port: Some(IntOrString::Int(port)),
            node_port: node_ports.then_some(port),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::tests::make_state;
    use crate::types::edgelake::*;

    fn with_ports(service_type: ServiceType, broker: Option<i32>) -> DesiredState {
        make_state("node1", |spec| {
            spec.metadata = Some(MetadataSpec {
                service_type: Some(service_type),
                ..Default::default()
            });
            spec.node_configs = Some(NodeConfigsSpec {
                networking: Some(NetworkingConfig {
                    server_port: Some(32548),
                    rest_port: Some(32549),
                    broker_port: broker,
                    ..Default::default()
                }),
                ..Default::default()
            });
        })
    }

    #[test]
    fn test_node_port_service() {
        let svc = build_service(&with_ports(ServiceType::NodePort, Some(32550)));
        let spec = svc.spec.unwrap();
        let ports = spec.ports.unwrap();

        assert_eq!(svc.metadata.name.as_deref(), Some("node1-service"));
        assert_eq!(spec.type_.as_deref(), Some("NodePort"));
        assert_eq!(ports.len(), 3);
        for (port, (name, number)) in ports.iter().zip([
            ("tcp-server", 32548),
            ("rest-api", 32549),
            ("mqtt-broker", 32550),
        ]) {
            assert_eq!(port.name.as_deref(), Some(name));
            assert_eq!(port.port, number);
            assert_eq!(port.node_port, Some(number));
            assert_eq!(port.target_port, Some(IntOrString::Int(number)));
        }
    }

    #[test]
    fn test_cluster_ip_service_has_no_node_ports() {
        let svc = build_service(&with_ports(ServiceType::ClusterIp, None));
        let spec = svc.spec.unwrap();
        let ports = spec.ports.unwrap();

        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        assert_eq!(ports.len(), 2);
        assert!(ports.iter().all(|p| p.node_port.is_none()));
        assert!(spec.cluster_ip.is_none());
    }

    #[test]
    fn test_selector_targets_the_pod() {
        let state = with_ports(ServiceType::LoadBalancer, None);
        let spec = build_service(&state).spec.unwrap();

        assert_eq!(spec.selector, Some(selector_labels(&state)));
        assert!(spec.ports.unwrap().iter().all(|p| p.node_port.is_some()));
    }
}
