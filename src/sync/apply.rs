// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Applies a single sync record against the API server.

use crate::constants::sync::MAX_CONFLICT_RETRIES;
use crate::error::{OperatorError, Result};
use crate::sync::syncer::{SyncKey, SyncKind, SyncSource};
use crate::types::ResourceLocation;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{DeleteParams, ObjectMeta, PostParams};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info, instrument};

/// Namespaced resources whose payload can be mirrored between namespaces
pub trait Syncable:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
{
    /// A copy of the payload under the destination identity, without source metadata
    fn mirror(&self, destination: &ResourceLocation) -> Self;

    fn same_content(&self, other: &Self) -> bool;
}

fn destination_meta(destination: &ResourceLocation) -> ObjectMeta {
    ObjectMeta {
        name: Some(destination.name.clone()),
        namespace: Some(destination.namespace.clone()),
        ..Default::default()
    }
}

impl Syncable for ConfigMap {
    fn mirror(&self, destination: &ResourceLocation) -> Self {
        ConfigMap {
            metadata: destination_meta(destination),
            data: self.data.clone(),
            binary_data: self.binary_data.clone(),
            immutable: None,
        }
    }

    fn same_content(&self, other: &Self) -> bool {
        self.data == other.data && self.binary_data == other.binary_data
    }
}

impl Syncable for Secret {
    fn mirror(&self, destination: &ResourceLocation) -> Self {
        Secret {
            metadata: destination_meta(destination),
            data: self.data.clone(),
            string_data: None,
            type_: self.type_.clone(),
            immutable: None,
        }
    }

    fn same_content(&self, other: &Self) -> bool {
        self.data == other.data && self.type_ == other.type_
    }
}

/// Converges the destination of `key` to `source`.
pub async fn apply(client: &Client, key: &SyncKey, source: &SyncSource) -> Result<()> {
    match key.kind {
        SyncKind::ConfigMap => apply_resource::<ConfigMap>(client, &key.destination, source).await,
        SyncKind::Secret => apply_resource::<Secret>(client, &key.destination, source).await,
    }
}

#[instrument(skip_all, fields(destination = %destination, source = %source))]
async fn apply_resource<K: Syncable>(
    client: &Client,
    destination: &ResourceLocation,
    source: &SyncSource,
) -> Result<()> {
    let destination_api: Api<K> = Api::namespaced(client.clone(), &destination.namespace);

    let location = match source {
        SyncSource::Delete => return delete_if_exists(&destination_api, destination).await,
        SyncSource::Mirror(location) => location,
    };

    let source_api: Api<K> = Api::namespaced(client.clone(), &location.namespace);
    let Some(source_obj) = source_api.get_opt(&location.name).await? else {
        return Err(OperatorError::SourceNotFound(location.to_string()));
    };
    let desired = source_obj.mirror(destination);

    for attempt in 1..=MAX_CONFLICT_RETRIES {
        let result = match destination_api.get_opt(&destination.name).await? {
            None => {
                info!("Creating {}", destination);
                destination_api
                    .create(&PostParams::default(), &desired)
                    .await
            }
            Some(existing) if existing.same_content(&desired) => {
                debug!("{} already up to date", destination);
                return Ok(());
            }
            Some(existing) => {
                info!("Updating {}", destination);
                let mut updated = desired.clone();
                updated.meta_mut().resource_version = existing.meta().resource_version.clone();
                updated.meta_mut().labels = existing.meta().labels.clone();
                updated.meta_mut().annotations = existing.meta().annotations.clone();
                destination_api
                    .replace(&destination.name, &PostParams::default(), &updated)
                    .await
            }
        };

        match result {
            Ok(_) => return Ok(()),
            Err(kube::Error::Api(err)) if err.code == 409 => {
                debug!(attempt, "Conflict writing {}, re-reading", destination);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(OperatorError::SyncConflict(format!(
        "{} still conflicting after {} attempts",
        destination, MAX_CONFLICT_RETRIES
    )))
}

async fn delete_if_exists<K: Syncable>(api: &Api<K>, destination: &ResourceLocation) -> Result<()> {
    match api.delete(&destination.name, &DeleteParams::default()).await {
        Ok(_) => {
            info!("Deleted {}", destination);
            Ok(())
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("{} already absent", destination);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
