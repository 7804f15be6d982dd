// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery, child convergence and finalizers.

pub mod converge;
pub mod crd;
pub mod finalizer;

pub use crd::wait_for_edgelake_crd;
