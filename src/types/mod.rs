// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource definition and the resolved desired state derived from it.

pub mod desired;
pub mod edgelake;

pub use desired::{DesiredState, Identity, VolumeKind};
pub use edgelake::{EdgeLakeOperator, EdgeLakeOperatorSpec, EdgeLakeOperatorStatus, Phase};
