// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::runtime::{watcher, Controller};
use kube::{Api, Client};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use schedop::config::Config;
use schedop::events::EventPublisher;
use schedop::kubernetes::wait_for_scheduler_crd;
use schedop::observation::{scheduler_observers, ConfigObserverController, Listers};
use schedop::reconcilers::SchedulerReconciler;
use schedop::sync::ResourceSyncController;
use schedop::types::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting scheduler config operator");

    let config = Config::from_env().context("Invalid operator configuration")?;
    info!(
        "Configuration loaded: resync_interval={:?}, sync_backoff={:?}..{:?}",
        config.resync_interval, config.sync_initial_backoff, config.sync_max_backoff
    );

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for Scheduler CRD to become available...");
    wait_for_scheduler_crd(&client).await?;

    // The controller's reflector store doubles as the observer's lister cache
    let schedulers: Api<Scheduler> = Api::all(client.clone());
    let controller = Controller::new(schedulers, watcher::Config::default());
    let scheduler_store = controller.store();

    let (sync_controller, sync_handle) = ResourceSyncController::new(client.clone(), &config);
    let (event_publisher, recorder) = EventPublisher::new(client.clone());

    let listers = Listers {
        scheduler_lister: Arc::new(scheduler_store),
        resource_sync: Arc::new(sync_handle.clone()),
    };
    let observer = Arc::new(ConfigObserverController::new(
        listers,
        Arc::new(recorder),
        scheduler_observers(),
    ));

    let mut observed = observer.subscribe();
    let log_observed = async move {
        while observed.changed().await.is_ok() {
            let tree = observed.borrow_and_update().clone();
            match serde_yaml::to_string(&tree) {
                Ok(yaml) => info!("Observed config:\n{}", yaml),
                Err(e) => warn!("Failed to render observed config: {}", e),
            }
        }
        Ok::<_, anyhow::Error>(())
    };

    let reconciler = SchedulerReconciler::new(observer, sync_handle, config.resync_interval);

    info!("Starting controllers...");

    tokio::try_join!(
        sync_controller.run(),
        event_publisher.run(),
        reconciler.run(controller),
        log_observed
    )?;

    warn!("All controllers stopped unexpectedly");
    Ok(())
}
