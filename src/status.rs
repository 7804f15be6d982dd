// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Status projection for the EdgeLakeOperator.
//!
//! Everything here is pure: the reconciler passes in the previous status, the live
//! Deployment and the current time, and decides itself whether to persist the result.

use crate::constants::conditions;
use crate::types::edgelake::{Condition, Endpoints};
use crate::types::{DesiredState, EdgeLakeOperatorStatus, Phase};
use chrono::{SecondsFormat, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use std::fmt::Display;

/// Current time in the RFC 3339 form used for condition timestamps
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A workload is ready when every replica is ready and there is at least one
pub fn is_ready(ready_replicas: i32, replicas: i32) -> bool {
    replicas > 0 && ready_replicas == replicas
}

/// Status written on first observation of a parent
pub fn pending() -> EdgeLakeOperatorStatus {
    EdgeLakeOperatorStatus {
        phase: Some(Phase::Pending),
        ..Default::default()
    }
}

/// Same status with the phase moved to Creating
pub fn creating(previous: &EdgeLakeOperatorStatus) -> EdgeLakeOperatorStatus {
    EdgeLakeOperatorStatus {
        phase: Some(Phase::Creating),
        ..previous.clone()
    }
}

/// Whether Creating should be persisted before children are converged.
/// A parent that is already Running at the current generation stays Running on a resync.
pub fn needs_creating_write(previous: &EdgeLakeOperatorStatus, generation: Option<i64>) -> bool {
    match previous.phase {
        None | Some(Phase::Pending) | Some(Phase::Failed) => true,
        Some(_) => previous.observed_generation != generation,
    }
}

/// Project the observed Deployment onto a new status
pub fn project(
    previous: &EdgeLakeOperatorStatus,
    deployment: Option<&Deployment>,
    generation: Option<i64>,
    state: &DesiredState,
    now: &str,
) -> EdgeLakeOperatorStatus {
    let mut status = previous.clone();

    let (ready, reason, message) = match deployment {
        None => (
            false,
            conditions::REASON_DEPLOYMENT_NOT_FOUND,
            "EdgeLake deployment not found",
        ),
        Some(deployment) => {
            let observed = deployment.status.clone().unwrap_or_default();
            let ready_replicas = observed.ready_replicas.unwrap_or(0);
            let replicas = observed.replicas.unwrap_or(0);
            if is_ready(ready_replicas, replicas) {
                (
                    true,
                    conditions::REASON_DEPLOYMENT_READY,
                    "EdgeLake deployment is ready",
                )
            } else {
                (
                    false,
                    conditions::REASON_DEPLOYMENT_NOT_READY,
                    "EdgeLake deployment is not ready",
                )
            }
        }
    };

    status.phase = Some(if ready { Phase::Running } else { Phase::Creating });
    status.ready = ready;
    set_condition(
        &mut status.conditions,
        conditions::READY,
        ready,
        reason,
        message,
        now,
    );

    status.observed_generation = generation;
    status.deployment_name = Some(state.metadata.deployment_name.clone());
    status.service_name = Some(state.metadata.service_name.clone());
    status.config_map_name = Some(state.metadata.config_map_name.clone());
    status.pvc_names = state.claim_names();
    status.endpoints = Some(endpoints(state));
    status
}

/// Status after a failed convergence pass
pub fn failed(
    previous: &EdgeLakeOperatorStatus,
    error: &impl Display,
    now: &str,
) -> EdgeLakeOperatorStatus {
    let mut status = previous.clone();
    status.phase = Some(Phase::Failed);
    status.ready = false;
    set_condition(
        &mut status.conditions,
        conditions::READY,
        false,
        conditions::REASON_RECONCILIATION_FAILED,
        &format!("Reconciliation failed: {}", error),
        now,
    );
    status
}

fn endpoints(state: &DesiredState) -> Endpoints {
    let host = state.service_host();
    let net = &state.node_configs.networking;

    Endpoints {
        tcp: format!("{}:{}", host, net.server_port),
        rest: format!("{}:{}", host, net.rest_port),
        broker: net.broker_port.map(|port| format!("{}:{}", host, port)),
    }
}

/// Upsert a condition. The transition time only moves when the status value flips.
fn set_condition(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    value: bool,
    reason: &str,
    message: &str,
    now: &str,
) {
    let value = if value { "True" } else { "False" };

    match conditions
        .iter_mut()
        .find(|c| c.condition_type == condition_type)
    {
        Some(existing) => {
            if existing.status != value {
                existing.last_transition_time = now.to_string();
            }
            existing.status = value.to_string();
            existing.reason = reason.to_string();
            existing.message = message.to_string();
        }
        None => conditions.push(Condition {
            condition_type: condition_type.to_string(),
            status: value.to_string(),
            reason: reason.to_string(),
            message: message.to_string(),
            last_transition_time: now.to_string(),
        }),
    }
}
