// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Finalizer bookkeeping on the parent resource.
//!
//! Both directions are merge patches that carry the observed resourceVersion, so a
//! parent that changed since it was read yields a conflict instead of clobbering
//! someone else's finalizer list.

use crate::constants::FINALIZER;
use crate::error::Result;
use kube::{
    api::{Patch, PatchParams},
    Api, Resource, ResourceExt,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt::Debug;
use tracing::{info, instrument};

pub fn has_finalizer<K: Resource>(obj: &K) -> bool {
    obj.finalizers().iter().any(|f| f == FINALIZER)
}

/// Add our finalizer and return the updated object
#[instrument(skip_all, fields(name = %obj.name_any()))]
pub async fn add_finalizer<K>(api: &Api<K>, obj: &K) -> Result<K>
where
    K: Resource + Clone + Debug + DeserializeOwned,
{
    let mut finalizers = obj.finalizers().to_vec();
    finalizers.push(FINALIZER.to_string());

    let patched = patch_finalizers(api, obj, finalizers).await?;
    info!("Added finalizer {}", FINALIZER);
    Ok(patched)
}

/// Drop our finalizer, leaving any others in place
#[instrument(skip_all, fields(name = %obj.name_any()))]
pub async fn remove_finalizer<K>(api: &Api<K>, obj: &K) -> Result<()>
where
    K: Resource + Clone + Debug + DeserializeOwned,
{
    let finalizers: Vec<String> = obj
        .finalizers()
        .iter()
        .filter(|f| f.as_str() != FINALIZER)
        .cloned()
        .collect();

    patch_finalizers(api, obj, finalizers).await?;
    info!("Removed finalizer {}", FINALIZER);
    Ok(())
}

async fn patch_finalizers<K>(api: &Api<K>, obj: &K, finalizers: Vec<String>) -> Result<K>
where
    K: Resource + Clone + Debug + DeserializeOwned,
{
    let patch = json!({
        "metadata": {
            "finalizers": finalizers,
            "resourceVersion": obj.resource_version(),
        }
    });

    Ok(api
        .patch(&obj.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?)
}
