// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Manifest builders for the child objects of an EdgeLakeOperator.
//!
//! Every builder is a pure function of the resolved [`DesiredState`]. None of them
//! apply defaults or attach owner references; that is left to the reconciler.

pub mod configmap;
pub mod deployment;
pub mod labels;
pub mod pvc;
pub mod service;

pub use configmap::build_config_map;
pub use deployment::build_deployment;
pub use pvc::build_pvcs;
pub use service::build_service;

use crate::types::DesiredState;
use kube::api::ObjectMeta;

/// Metadata for a child object named `name` in the parent's namespace
fn child_meta(state: &DesiredState, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(state.identity.namespace.clone()),
        labels: Some(labels::labels(state)),
        ..Default::default()
    }
}
