// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Cluster-wide scheduler configuration, a singleton conventionally named `cluster`.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "config.openshift.io", version = "v1", kind = "Scheduler")]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSpec {
    /// Reference to a config map in `openshift-config` holding the scheduler policy
    #[serde(default)]
    pub policy: ConfigMapNameReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_node_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masters_schedulable: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub struct ConfigMapNameReference {
    #[serde(default)]
    pub name: String,
}

impl Scheduler {
    /// The referenced policy config map name, `None` when unset or empty
    pub fn policy_name(&self) -> Option<&str> {
        Some(self.spec.policy.name.as_str()).filter(|name| !name.is_empty())
    }
}
