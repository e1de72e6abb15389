// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sync intent registry shared between observers and the sync loop.

use crate::constants::namespaces;
use crate::error::{OperatorError, Result};
use crate::types::ResourceLocation;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Mirrors a source resource into a destination, or removes the destination
/// when the source is the tombstone location.
pub trait ResourceSyncer: Send + Sync {
    fn sync_config_map(&self, destination: &ResourceLocation, source: &ResourceLocation) -> Result<()>;
    fn sync_secret(&self, destination: &ResourceLocation, source: &ResourceLocation) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyncKind {
    ConfigMap,
    Secret,
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncKind::ConfigMap => write!(f, "configmap"),
            SyncKind::Secret => write!(f, "secret"),
        }
    }
}

/// A sync record is keyed by its destination
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyncKey {
    pub kind: SyncKind,
    pub destination: ResourceLocation,
}

impl fmt::Display for SyncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.destination)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSource {
    Mirror(ResourceLocation),
    Delete,
}

impl From<&ResourceLocation> for SyncSource {
    fn from(source: &ResourceLocation) -> Self {
        if source.is_tombstone() {
            SyncSource::Delete
        } else {
            SyncSource::Mirror(source.clone())
        }
    }
}

impl fmt::Display for SyncSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncSource::Mirror(location) => write!(f, "{}", location),
            SyncSource::Delete => write!(f, "DELETE"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct SyncState {
    records: RwLock<HashMap<SyncKey, SyncSource>>,
    degraded: RwLock<BTreeMap<SyncKey, String>>,
    allowed_destination_namespaces: HashSet<String>,
    allowed_source_namespaces: HashSet<String>,
}

impl SyncState {
    pub(crate) fn new() -> Self {
        Self {
            records: RwLock::default(),
            degraded: RwLock::default(),
            allowed_destination_namespaces: HashSet::from([namespaces::TARGET.to_string()]),
            allowed_source_namespaces: HashSet::from([
                namespaces::GLOBAL_USER_SPECIFIED_CONFIG.to_string(),
                namespaces::TARGET.to_string(),
            ]),
        }
    }

    pub(crate) fn record(&self, key: &SyncKey) -> Option<SyncSource> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Keys to re-apply on resync; degraded keys wait for a new intent
    pub(crate) fn resync_keys(&self) -> Vec<SyncKey> {
        let degraded: HashSet<SyncKey> = self
            .degraded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let keys = records
            .keys()
            .filter(|key| !degraded.contains(*key))
            .cloned()
            .collect();
        keys
    }

    pub(crate) fn set_degraded(&self, key: &SyncKey, message: String) {
        self.degraded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), message);
    }

    pub(crate) fn clear_degraded(&self, key: &SyncKey) {
        self.degraded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Stores the intent, returning whether it differs from the previous one
    fn register(&self, key: SyncKey, source: SyncSource) -> Result<bool> {
        if !self
            .allowed_destination_namespaces
            .contains(&key.destination.namespace)
        {
            return Err(OperatorError::SyncNotAllowed(format!(
                "not allowed to sync {} into namespace {:?}",
                key, key.destination.namespace
            )));
        }
        if let SyncSource::Mirror(location) = &source {
            if !self.allowed_source_namespaces.contains(&location.namespace) {
                return Err(OperatorError::SyncNotAllowed(format!(
                    "not allowed to sync {} from namespace {:?}",
                    key, location.namespace
                )));
            }
        }

        let mut records = self
            .records
            .write()
            .map_err(|e| OperatorError::SyncUnavailable(e.to_string()))?;
        let changed = records.get(&key) != Some(&source);
        if changed {
            info!(destination = %key, source = %source, "Registered sync intent");
            self.clear_degraded(&key);
            records.insert(key, source);
        }
        Ok(changed)
    }
}

/// Cheap handle for registering sync intent; the [`super::ResourceSyncController`]
/// performs the actual writes.
#[derive(Clone)]
pub struct ResourceSyncHandle {
    state: Arc<SyncState>,
    work_tx: mpsc::UnboundedSender<SyncKey>,
}

impl ResourceSyncHandle {
    pub(crate) fn new(state: Arc<SyncState>, work_tx: mpsc::UnboundedSender<SyncKey>) -> Self {
        Self { state, work_tx }
    }

    /// Messages for destinations that failed with a non-retryable error
    pub fn degraded_conditions(&self) -> Vec<String> {
        self.state
            .degraded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, message)| format!("{}: {}", key, message))
            .collect()
    }

    fn sync(&self, kind: SyncKind, destination: &ResourceLocation, source: &ResourceLocation) -> Result<()> {
        let key = SyncKey {
            kind,
            destination: destination.clone(),
        };

        if !self.state.register(key.clone(), SyncSource::from(source))? {
            debug!(destination = %key, "Sync intent unchanged");
            return Ok(());
        }

        self.work_tx
            .send(key)
            .map_err(|e| OperatorError::SyncUnavailable(format!("sync loop stopped, dropped {}", e.0)))
    }
}

impl ResourceSyncer for ResourceSyncHandle {
    fn sync_config_map(&self, destination: &ResourceLocation, source: &ResourceLocation) -> Result<()> {
        self.sync(SyncKind::ConfigMap, destination, source)
    }

    fn sync_secret(&self, destination: &ResourceLocation, source: &ResourceLocation) -> Result<()> {
        self.sync(SyncKind::Secret, destination, source)
    }
}
