// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Print the EdgeLakeOperator CustomResourceDefinition as YAML

use edgelake_operator::types::EdgeLakeOperator;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&EdgeLakeOperator::crd())?);
    Ok(())
}
