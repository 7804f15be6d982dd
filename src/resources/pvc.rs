// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::child_meta;
use crate::types::{DesiredState, VolumeKind};
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

/// One claim per volume kind, or none when persistence is disabled
pub fn build_pvcs(state: &DesiredState) -> Vec<PersistentVolumeClaim> {
    if !state.persistence.enabled {
        return Vec::new();
    }

    VolumeKind::ALL
        .iter()
        .map(|kind| build_pvc(state, *kind))
        .collect()
}

fn build_pvc(state: &DesiredState, kind: VolumeKind) -> PersistentVolumeClaim {
    let persistence = &state.persistence;

    PersistentVolumeClaim {
        metadata: child_meta(state, &state.claim_name(kind)),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![persistence.access_mode.clone()]),
            storage_class_name: persistence.storage_class_name.clone(),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(state.volume_size(kind).to_string()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
