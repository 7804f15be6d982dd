// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// API group of the EdgeLakeOperator custom resource
pub const API_GROUP: &str = "edgelake.trv.io";
pub const API_VERSION: &str = "v1alpha1";
pub const KIND: &str = "EdgeLakeOperator";

/// Finalizer that keeps a deleting EdgeLakeOperator in the store until we release it
pub const FINALIZER: &str = "edgelake.trv.io/finalizer";

/// The operator name, used as the managed-by label value
pub const OPERATOR_NAME: &str = "edgelake-operator";

/// Kubernetes annotation keys used by the operator
pub mod annotations {
    /// Hash of the rendered ConfigMap data, set on the pod template
    pub const CONFIG_HASH: &str = "edgelake.trv.io/config-hash";
}

/// Status condition types and reasons
pub mod conditions {
    pub const READY: &str = "Ready";

    pub const REASON_DEPLOYMENT_READY: &str = "DeploymentReady";
    pub const REASON_DEPLOYMENT_NOT_READY: &str = "DeploymentNotReady";
    pub const REASON_DEPLOYMENT_NOT_FOUND: &str = "DeploymentNotFound";
    pub const REASON_RECONCILIATION_FAILED: &str = "ReconciliationFailed";
}

/// Requeue defaults, overridable through the environment
pub mod requeue {
    /// Unconditional resync after a successful pass
    pub const RESYNC_INTERVAL_SECS: u64 = 30;
    pub const ERROR_REQUEUE_SECS: u64 = 60;
    /// Optimistic concurrency conflicts retry the whole pass almost immediately
    pub const CONFLICT_REQUEUE_SECS: u64 = 1;
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
