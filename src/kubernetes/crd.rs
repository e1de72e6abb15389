// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{GROUP, POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Wait for the Scheduler CRD to become available in the cluster.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
pub async fn wait_for_scheduler_crd(client: &Client) -> Result<()> {
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match check_scheduler_crd_exists(client).await {
            Ok(true) => {
                info!("Scheduler CRD ({}/v1) is available", GROUP);
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "Scheduler CRD ({}/v1) not yet available, waiting {} seconds...",
                    GROUP, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for Scheduler CRD: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Whether discovery of the `config.openshift.io` group serves a `v1` `Scheduler` kind.
async fn check_scheduler_crd_exists(client: &Client) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[GROUP])
        .run()
        .await?;

    let found = discovery
        .groups()
        .filter(|group| group.name() == GROUP)
        .flat_map(|group| group.recommended_resources())
        .any(|(ar, _)| ar.kind == "Scheduler" && ar.version == "v1");
    Ok(found)
}
