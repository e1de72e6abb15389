// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Runs all observers over the last observed config and publishes the result.

use crate::error::OperatorError;
use crate::events::EventRecorder;
use crate::observation::tree::{self, ConfigTree};
use crate::observation::{Listers, Observer};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

pub struct ConfigObserverController {
    listers: Listers,
    recorder: Arc<dyn EventRecorder>,
    observers: Vec<Observer>,
    /// Last observed config; the lock also keeps passes sequential
    observed: Mutex<ConfigTree>,
    published: watch::Sender<ConfigTree>,
}

impl ConfigObserverController {
    pub fn new(listers: Listers, recorder: Arc<dyn EventRecorder>, observers: Vec<Observer>) -> Self {
        let (published, _) = watch::channel(ConfigTree::new());
        Self {
            listers,
            recorder,
            observers,
            observed: Mutex::new(ConfigTree::new()),
            published,
        }
    }

    /// Receives every newly observed config tree
    pub fn subscribe(&self) -> watch::Receiver<ConfigTree> {
        self.published.subscribe()
    }

    pub fn observed_config(&self) -> ConfigTree {
        self.observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs one observation pass and returns the errors of every observer.
    ///
    /// A failing observer leaves its own path as it was; the others still run.
    #[instrument(skip(self))]
    pub fn sync(&self) -> Vec<OperatorError> {
        let mut current = self.observed.lock().unwrap_or_else(PoisonError::into_inner);

        let mut observed = current.clone();
        let mut errors = Vec::new();
        for observer in &self.observers {
            let (next, errs) = (observer.observe)(&self.listers, self.recorder.as_ref(), &observed);
            for e in &errs {
                warn!(observer = observer.name, "Observation failed: {}", e);
            }
            errors.extend(errs);
            observed = next;
        }

        let changed = tree::changed_paths(&current, &observed);
        if changed.is_empty() {
            debug!("Observed config unchanged");
            return errors;
        }

        info!(paths = ?changed, "Observed config changed");
        let message = format!("Observed config changed at: {}", changed.join(", "));
        if let Err(e) = self.recorder.event("ObservedConfigChanged", &message) {
            warn!("Failed to record event: {}", e);
        }

        *current = observed.clone();
        self.published.send_replace(observed);
        errors
    }
}
