// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Observes `schedulers.config.openshift.io/cluster` into `algorithmSource`.

use crate::constants::{namespaces, CLUSTER_RESOURCE_NAME, POLICY_CONFIG_MAP_NAME};
use crate::error::OperatorError;
use crate::events::EventRecorder;
use crate::observation::tree::{self, ConfigTree};
use crate::observation::Listers;
use crate::types::ResourceLocation;
use serde_json::{json, Value};
use tracing::{debug, warn};

const ALGORITHM_SOURCE_PATH: &[&str] = &["algorithmSource"];
const POLICY_CONFIG_MAP_PATH: &[&str] = &["algorithmSource", "policy", "configMap"];

/// Points `algorithmSource.policy.configMap` at the operand copy of the policy
/// config map and registers the matching sync.
///
/// The observed identity is always `policy-configmap` in the target namespace,
/// whatever the cluster resource names; only the sync source follows it. An
/// empty name removes `algorithmSource` entirely and deletes the copy.
pub fn observe_scheduler_config(
    listers: &Listers,
    recorder: &dyn EventRecorder,
    existing: &ConfigTree,
) -> (ConfigTree, Vec<OperatorError>) {
    let mut errs = Vec::new();

    let scheduler = match listers.scheduler_lister.get_by_name(CLUSTER_RESOURCE_NAME) {
        Ok(Some(scheduler)) => scheduler,
        Ok(None) => {
            errs.push(OperatorError::ResourceNotFound(format!(
                "schedulers.config.openshift.io/{}",
                CLUSTER_RESOURCE_NAME
            )));
            return (existing.clone(), errs);
        }
        Err(e) => {
            errs.push(e);
            return (existing.clone(), errs);
        }
    };

    let destination = ResourceLocation::new(POLICY_CONFIG_MAP_NAME, namespaces::TARGET);
    let mut observed = existing.clone();

    let source = scheduler
        .policy_name()
        .map(|name| ResourceLocation::new(name, namespaces::GLOBAL_USER_SPECIFIED_CONFIG))
        .unwrap_or_default();

    // Level triggered: register the sync on every pass, not just on change,
    // and independently of whether the tree below can be written.
    if let Err(e) = listers.resource_sync.sync_config_map(&destination, &source) {
        errs.push(e);
    }

    if source.is_tombstone() {
        tree::remove_nested_field(&mut observed, ALGORITHM_SOURCE_PATH);
    } else {
        let policy = json!({
            "name": POLICY_CONFIG_MAP_NAME,
            "namespace": namespaces::TARGET,
        });
        if let Err(e) = tree::set_nested_field(&mut observed, policy, POLICY_CONFIG_MAP_PATH) {
            errs.push(e);
            return (existing.clone(), errs);
        }
    }

    let before = tree::nested_field(existing, ALGORITHM_SOURCE_PATH);
    let after = tree::nested_field(&observed, ALGORITHM_SOURCE_PATH);
    if before != after {
        let message = format!(
            "algorithmSource changed from {} to {}",
            describe(before),
            describe(after)
        );
        debug!("{}", message);
        if let Err(e) = recorder.event("ObserveSchedulerPolicy", &message) {
            warn!("Failed to record event: {}", e);
        }
    }

    (observed, errs)
}

fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "<unset>".to_string(), Value::to_string)
}
