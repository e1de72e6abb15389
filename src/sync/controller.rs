// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Work queue that converges registered sync records.

use crate::config::Config;
use crate::sync::apply::apply;
use crate::sync::syncer::{ResourceSyncHandle, SyncKey, SyncState};
use kube::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy)]
struct Pending {
    due: Instant,
    /// Delay applied after the next transient failure
    backoff: Duration,
}

/// Retry schedule for a single key: exponential, capped at `max`.
#[derive(Debug, Clone, Copy)]
struct Backoff {
    initial: Duration,
    max: Duration,
}

impl Backoff {
    fn fresh(&self, now: Instant) -> Pending {
        Pending {
            due: now,
            backoff: self.initial,
        }
    }

    fn retry(&self, pending: &mut Pending, now: Instant) {
        pending.due = now + pending.backoff;
        pending.backoff = (pending.backoff * 2).min(self.max);
    }
}

/// Asynchronous loop performing the create/update/delete work behind
/// [`ResourceSyncHandle`] registrations.
pub struct ResourceSyncController {
    client: Client,
    state: Arc<SyncState>,
    work_rx: mpsc::UnboundedReceiver<SyncKey>,
    resync_interval: Duration,
    backoff: Backoff,
}

impl ResourceSyncController {
    pub fn new(client: Client, config: &Config) -> (Self, ResourceSyncHandle) {
        let (work_tx, work_rx) = mpsc::unbounded_channel();
        let state = Arc::new(SyncState::new());

        let controller = Self {
            client,
            state: state.clone(),
            work_rx,
            resync_interval: config.resync_interval,
            backoff: Backoff {
                initial: config.sync_initial_backoff,
                max: config.sync_max_backoff,
            },
        };

        (controller, ResourceSyncHandle::new(state, work_tx))
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        info!("ResourceSyncController started");

        let mut queue: HashMap<SyncKey, Pending> = HashMap::new();
        let mut resync = time::interval(self.resync_interval);
        resync.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            let next_due = queue.values().map(|p| p.due).min();

            tokio::select! {
                key = self.work_rx.recv() => {
                    let Some(key) = key else { break };
                    debug!(destination = %key, "Sync intent changed");
                    queue.insert(key, self.backoff.fresh(Instant::now()));
                }
                _ = resync.tick() => {
                    let now = Instant::now();
                    for key in self.state.resync_keys() {
                        queue.entry(key).or_insert_with(|| self.backoff.fresh(now));
                    }
                }
                _ = wait_until(next_due) => {
                    self.process_due(&mut queue).await;
                }
            }
        }

        warn!("All sync handles dropped, ResourceSyncController stopping");
        Ok(())
    }

    async fn process_due(&self, queue: &mut HashMap<SyncKey, Pending>) {
        let now = Instant::now();
        let due: Vec<SyncKey> = queue
            .iter()
            .filter(|(_, pending)| pending.due <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in due {
            let Some(source) = self.state.record(&key) else {
                queue.remove(&key);
                continue;
            };

            match apply(&self.client, &key, &source).await {
                Ok(()) => {
                    debug!(destination = %key, source = %source, "Sync converged");
                    queue.remove(&key);
                    self.state.clear_degraded(&key);
                }
                Err(e) if e.is_transient() => {
                    if let Some(pending) = queue.get_mut(&key) {
                        warn!(
                            destination = %key,
                            retry_in = ?pending.backoff,
                            "Transient sync failure: {}", e
                        );
                        self.backoff.retry(pending, Instant::now());
                    }
                }
                Err(e) => {
                    error!(destination = %key, "Sync failed permanently: {}", e);
                    queue.remove(&key);
                    self.state.set_degraded(&key, e.to_string());
                }
            }
        }
    }
}

async fn wait_until(due: Option<Instant>) {
    match due {
        Some(due) => time::sleep_until(due).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::namespaces;
    use crate::sync::ResourceSyncer;
    use crate::test_utils::MockService;
    use crate::types::ResourceLocation;

    const SOURCE_PATH: &str = "/api/v1/namespaces/openshift-config/configmaps/test-abc";
    const OTHER_SOURCE_PATH: &str = "/api/v1/namespaces/openshift-config/configmaps/other";
    const DEST_COLLECTION: &str = "/api/v1/namespaces/openshift-kube-scheduler/configmaps";

    fn config_map_json(name: &str, namespace: &str) -> String {
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": name, "namespace": namespace },
            "data": { "policy.cfg": "{}" }
        })
        .to_string()
    }

    fn test_config(resync_interval: Duration) -> Config {
        Config {
            resync_interval,
            sync_initial_backoff: Duration::from_millis(10),
            sync_max_backoff: Duration::from_millis(20),
        }
    }

    fn count(mock: &MockService, method: &str, path: &str) -> usize {
        mock.requests()
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }

    fn destination() -> ResourceLocation {
        ResourceLocation::new("policy-configmap", namespaces::TARGET)
    }

    fn source(name: &str) -> ResourceLocation {
        ResourceLocation::new(name, namespaces::GLOBAL_USER_SPECIFIED_CONFIG)
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_until_converged() {
        let mock = MockService::new();
        let (controller, handle) =
            ResourceSyncController::new(mock.clone().into_client(), &test_config(Duration::from_secs(3600)));

        let drive = async {
            handle.sync_config_map(&destination(), &source("test-abc")).unwrap();
            time::sleep(Duration::from_millis(150)).await;
            assert!(count(&mock, "GET", SOURCE_PATH) >= 2);
            assert_eq!(count(&mock, "POST", DEST_COLLECTION), 0);
            assert!(handle.degraded_conditions().is_empty());

            mock.clone()
                .on_get(SOURCE_PATH, 200, &config_map_json("test-abc", "openshift-config"))
                .on_post(
                    DEST_COLLECTION,
                    201,
                    &config_map_json("policy-configmap", "openshift-kube-scheduler"),
                );
            time::sleep(Duration::from_millis(150)).await;
            let converged_gets = count(&mock, "GET", SOURCE_PATH);
            assert_eq!(count(&mock, "POST", DEST_COLLECTION), 1);

            time::sleep(Duration::from_millis(100)).await;
            assert_eq!(count(&mock, "GET", SOURCE_PATH), converged_gets);
        };

        tokio::select! {
            _ = controller.run() => panic!("sync loop stopped early"),
            _ = drive => {}
        }
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried_until_intent_changes() {
        let forbidden = r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"forbidden","reason":"Forbidden","code":403}"#;
        let mock = MockService::new()
            .on_get(SOURCE_PATH, 403, forbidden)
            .on_get(OTHER_SOURCE_PATH, 200, &config_map_json("other", "openshift-config"))
            .on_post(
                DEST_COLLECTION,
                201,
                &config_map_json("policy-configmap", "openshift-kube-scheduler"),
            );
        let (controller, handle) =
            ResourceSyncController::new(mock.clone().into_client(), &test_config(Duration::from_millis(20)));

        let drive = async {
            handle.sync_config_map(&destination(), &source("test-abc")).unwrap();
            time::sleep(Duration::from_millis(200)).await;
            assert_eq!(count(&mock, "GET", SOURCE_PATH), 1);
            assert_eq!(handle.degraded_conditions().len(), 1);

            // Re-registering the same intent is not a new intent
            handle.sync_config_map(&destination(), &source("test-abc")).unwrap();
            time::sleep(Duration::from_millis(50)).await;
            assert_eq!(count(&mock, "GET", SOURCE_PATH), 1);

            handle.sync_config_map(&destination(), &source("other")).unwrap();
            time::sleep(Duration::from_millis(100)).await;
            assert!(handle.degraded_conditions().is_empty());
            assert!(count(&mock, "POST", DEST_COLLECTION) >= 1);
        };

        tokio::select! {
            _ = controller.run() => panic!("sync loop stopped early"),
            _ = drive => {}
        }
    }

    #[tokio::test]
    async fn test_new_intent_resets_backoff() {
        let mock = MockService::new();
        let config = Config {
            resync_interval: Duration::from_secs(3600),
            sync_initial_backoff: Duration::from_millis(200),
            sync_max_backoff: Duration::from_secs(10),
        };
        let (controller, handle) = ResourceSyncController::new(mock.clone().into_client(), &config);

        let drive = async {
            handle.sync_config_map(&destination(), &source("test-abc")).unwrap();
            time::sleep(Duration::from_millis(50)).await;
            assert_eq!(count(&mock, "GET", SOURCE_PATH), 1);

            // Next retry is ~200ms away; a changed intent is applied right away
            handle.sync_config_map(&destination(), &source("other")).unwrap();
            time::sleep(Duration::from_millis(50)).await;
            assert_eq!(count(&mock, "GET", OTHER_SOURCE_PATH), 1);
        };

        tokio::select! {
            _ = controller.run() => panic!("sync loop stopped early"),
            _ = drive => {}
        }
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let backoff = Backoff {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(5),
        };
        let start = Instant::now();
        let mut pending = backoff.fresh(start);
        assert_eq!(pending.due, start);

        let mut delays = Vec::new();
        for _ in 0..5 {
            let before = pending.backoff;
            backoff.retry(&mut pending, start);
            assert_eq!(pending.due, start + before);
            delays.push(before.as_secs());
        }

        assert_eq!(delays, vec![1, 2, 4, 5, 5]);
    }
}
