// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Labels shared by every child object of an EdgeLakeOperator

use crate::constants::OPERATOR_NAME;
use crate::types::DesiredState;
use std::collections::BTreeMap;

pub const NAME: &str = "app.kubernetes.io/name";
pub const INSTANCE: &str = "app.kubernetes.io/instance";
pub const VERSION: &str = "app.kubernetes.io/version";
pub const COMPONENT: &str = "app.kubernetes.io/component";
pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const APP: &str = "app";

/// Full label set for child object metadata
pub fn labels(state: &DesiredState) -> BTreeMap<String, String> {
    let mut labels = selector_labels(state);
    labels.insert(VERSION.to_string(), state.image.tag.clone());
    labels.insert(COMPONENT.to_string(), "edgelake".to_string());
    labels.insert(MANAGED_BY.to_string(), OPERATOR_NAME.to_string());
    labels
}

/// Stable subset used for the Service selector and the Deployment's pod selector.
/// Must not include anything that changes on upgrade, the Deployment selector is immutable.
pub fn selector_labels(state: &DesiredState) -> BTreeMap<String, String> {
    BTreeMap::from([
        (NAME.to_string(), OPERATOR_NAME.to_string()),
        (INSTANCE.to_string(), state.identity.name.clone()),
        (APP.to_string(), state.metadata.app_name.clone()),
    ])
}
