// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Name of the cluster-scoped singleton configuration resources
pub const CLUSTER_RESOURCE_NAME: &str = "cluster";

/// Namespaces the operator reads from and writes into
pub mod namespaces {
    /// Operand namespace; every synced resource and observed location lands here
    pub const TARGET: &str = "openshift-kube-scheduler";
    /// Namespace holding user specified configuration referenced by cluster resources
    pub const GLOBAL_USER_SPECIFIED_CONFIG: &str = "openshift-config";
}

/// Fixed identity of the scheduler policy config map in the operand namespace
pub const POLICY_CONFIG_MAP_NAME: &str = "policy-configmap";

/// The operator name used as field manager and event reporter
pub const OPERATOR_NAME: &str = "schedop";

/// CRD polling configuration
pub mod crd {
    /// API group serving the Scheduler resource
    pub const GROUP: &str = "config.openshift.io";
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Resource sync loop tuning
pub mod sync {
    /// Attempts to apply a destination before giving up on repeated 409 conflicts
    pub const MAX_CONFLICT_RETRIES: usize = 5;
}
