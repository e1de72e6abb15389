// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Scheduler reconciler - re-runs config observation when the cluster Scheduler changes.

use crate::constants::CLUSTER_RESOURCE_NAME;
use crate::error::{OperatorError, Result};
use crate::observation::ConfigObserverController;
use crate::sync::ResourceSyncHandle;
use crate::types::Scheduler;
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, reflector::Store, Controller},
    ResourceExt,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct SchedulerReconciler {
    observer: Arc<ConfigObserverController>,
    sync_handle: ResourceSyncHandle,
    resync_interval: Duration,
}

impl SchedulerReconciler {
    pub fn new(
        observer: Arc<ConfigObserverController>,
        sync_handle: ResourceSyncHandle,
        resync_interval: Duration,
    ) -> Self {
        Self {
            observer,
            sync_handle,
            resync_interval,
        }
    }

    /// Drives the controller, plus a ticker so a deleted singleton is still observed
    pub async fn run(self, controller: Controller<Scheduler>) -> anyhow::Result<()> {
        let store = controller.store();
        let context = Arc::new(self);
        let ticker_ctx = context.clone();

        let reconciling = controller
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled scheduler: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            });

        tokio::join!(reconciling, ticker_ctx.resync(store));
        Ok(())
    }

    /// Periodic observation, started once the scheduler cache has its initial list
    async fn resync(&self, store: Store<Scheduler>) {
        if let Err(e) = store.wait_until_ready().await {
            warn!("Scheduler cache never became ready, periodic observation disabled: {:?}", e);
            return;
        }

        let mut interval = tokio::time::interval(self.resync_interval);
        loop {
            interval.tick().await;
            self.observe();
        }
    }

    /// One observation pass; errors are reported, never fatal
    fn observe(&self) -> usize {
        let errors = self.observer.sync();
        for e in &errors {
            error!("Config observation error: {}", e);
        }

        for condition in self.sync_handle.degraded_conditions() {
            warn!("Resource sync degraded: {}", condition);
        }

        errors.len()
    }
}

async fn reconcile(scheduler: Arc<Scheduler>, ctx: Arc<SchedulerReconciler>) -> Result<Action> {
    let name = scheduler.name_any();

    if name != CLUSTER_RESOURCE_NAME {
        debug!("Ignoring scheduler {}, only {} is observed", name, CLUSTER_RESOURCE_NAME);
        return Ok(Action::await_change());
    }

    let failures = ctx.observe();
    if failures > 0 {
        info!("Observation finished with {} errors, retrying later", failures);
    }

    Ok(Action::requeue(ctx.resync_interval))
}

fn error_policy(
    _scheduler: Arc<Scheduler>,
    error: &OperatorError,
    ctx: Arc<SchedulerReconciler>,
) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(ctx.resync_interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperatorError;
    use crate::events::{EventRecorder, InMemoryRecorder};
    use crate::observation::{ConfigTree, Listers, Observer};
    use crate::sync::syncer::SyncState;
    use crate::types::SchedulerSpec;
    use kube::runtime::{reflector, watcher};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static PASSES: AtomicUsize = AtomicUsize::new(0);

    fn counting_observer(
        _listers: &Listers,
        _recorder: &dyn EventRecorder,
        existing: &ConfigTree,
    ) -> (ConfigTree, Vec<OperatorError>) {
        PASSES.fetch_add(1, Ordering::SeqCst);
        (existing.clone(), Vec::new())
    }

    #[tokio::test]
    async fn test_resync_waits_for_cache() {
        let (store, mut writer) = reflector::store::<Scheduler>();
        let (work_tx, _work_rx) = tokio::sync::mpsc::unbounded_channel();
        let sync_handle = ResourceSyncHandle::new(Arc::new(SyncState::new()), work_tx);
        let listers = Listers {
            scheduler_lister: Arc::new(store.clone()),
            resource_sync: Arc::new(sync_handle.clone()),
        };
        let observer = Arc::new(ConfigObserverController::new(
            listers,
            Arc::new(InMemoryRecorder::new()),
            vec![Observer {
                name: "counting",
                observe: counting_observer,
            }],
        ));
        let reconciler =
            SchedulerReconciler::new(observer, sync_handle, Duration::from_millis(10));

        let _ = tokio::time::timeout(Duration::from_millis(50), reconciler.resync(store.clone())).await;
        assert_eq!(PASSES.load(Ordering::SeqCst), 0);

        writer.apply_watcher_event(&watcher::Event::Init);
        writer.apply_watcher_event(&watcher::Event::InitApply(Scheduler::new(
            "cluster",
            SchedulerSpec::default(),
        )));
        writer.apply_watcher_event(&watcher::Event::InitDone);

        let _ = tokio::time::timeout(Duration::from_millis(50), reconciler.resync(store)).await;
        assert!(PASSES.load(Ordering::SeqCst) > 0);
    }
}
