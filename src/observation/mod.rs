// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Config observers derive operand configuration from cluster state.
//!
//! Each observer owns one path of the [`ConfigTree`] and returns a new tree with
//! only that path changed, along with any errors it ran into.

pub mod controller;
pub mod scheduler;
pub mod tree;

use crate::error::OperatorError;
use crate::events::EventRecorder;
use crate::kubernetes::SchedulerLister;
use crate::sync::ResourceSyncer;
use std::sync::Arc;

pub use controller::ConfigObserverController;
pub use tree::ConfigTree;

/// Capabilities handed to every observer
#[derive(Clone)]
pub struct Listers {
    pub scheduler_lister: Arc<dyn SchedulerLister>,
    pub resource_sync: Arc<dyn ResourceSyncer>,
}

pub type ObserveConfigFn =
    fn(&Listers, &dyn EventRecorder, &ConfigTree) -> (ConfigTree, Vec<OperatorError>);

#[derive(Clone, Copy)]
pub struct Observer {
    pub name: &'static str,
    pub observe: ObserveConfigFn,
}

/// Observers run by the scheduler operator, in order
pub fn scheduler_observers() -> Vec<Observer> {
    vec![Observer {
        name: "scheduler-policy",
        observe: scheduler::observe_scheduler_config,
    }]
}
