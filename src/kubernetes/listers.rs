// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Read-only accessors over watch-backed caches

use crate::error::Result;
use crate::types::Scheduler;
use kube::runtime::reflector::{ObjectRef, Store};
use std::sync::Arc;

/// Lookup of cluster-scoped `Scheduler` resources by name
pub trait SchedulerLister: Send + Sync {
    /// `Ok(None)` when the resource is not (yet) in the cache
    fn get_by_name(&self, name: &str) -> Result<Option<Arc<Scheduler>>>;
}

impl SchedulerLister for Store<Scheduler> {
    fn get_by_name(&self, name: &str) -> Result<Option<Arc<Scheduler>>> {
        Ok(self.get(&ObjectRef::new(name)))
    }
}
