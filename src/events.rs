// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Audit events for observed configuration changes.
//!
//! Recording is best effort: callers log and drop recorder errors.

use crate::constants::{CLUSTER_RESOURCE_NAME, OPERATOR_NAME};
use crate::error::{OperatorError, Result};
use crate::types::Scheduler;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Kubernetes limits the event note to 1kB
const MAX_NOTE_BYTES: usize = 1024;

/// Sink for human readable configuration change notifications
pub trait EventRecorder: Send + Sync {
    fn event(&self, reason: &str, message: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub reason: String,
    pub message: String,
}

/// Keeps events in memory, for tests and for inspecting what would be published
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventRecorder for InMemoryRecorder {
    fn event(&self, reason: &str, message: &str) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| OperatorError::EventError(e.to_string()))?;
        events.push(RecordedEvent {
            reason: reason.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

/// Recorder handed to observers; enqueues events for the [`EventPublisher`]
#[derive(Clone)]
pub struct KubeEventRecorder {
    event_tx: mpsc::Sender<RecordedEvent>,
}

impl EventRecorder for KubeEventRecorder {
    fn event(&self, reason: &str, message: &str) -> Result<()> {
        self.event_tx
            .try_send(RecordedEvent {
                reason: reason.to_string(),
                message: message.to_string(),
            })
            .map_err(|e| OperatorError::EventError(e.to_string()))
    }
}

/// Publishes recorded events as Kubernetes events on the `Scheduler/cluster` object
pub struct EventPublisher {
    recorder: Recorder,
    reference: ObjectReference,
    event_rx: mpsc::Receiver<RecordedEvent>,
}

impl EventPublisher {
    pub fn new(client: Client) -> (Self, KubeEventRecorder) {
        let (event_tx, event_rx) = mpsc::channel(256);

        let publisher = Self {
            recorder: Recorder::new(client, Reporter::from(OPERATOR_NAME)),
            reference: scheduler_reference(),
            event_rx,
        };

        (publisher, KubeEventRecorder { event_tx })
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        info!("EventPublisher started");

        while let Some(recorded) = self.event_rx.recv().await {
            debug!(reason = %recorded.reason, "Publishing event");
            let event = Event {
                type_: EventType::Normal,
                reason: recorded.reason.clone(),
                note: Some(truncate_note(&recorded.message).to_string()),
                action: recorded.reason,
                secondary: None,
            };
            if let Err(e) = self.recorder.publish(&event, &self.reference).await {
                warn!("Failed to publish event: {}", e);
            }
        }

        Ok(())
    }
}

fn scheduler_reference() -> ObjectReference {
    ObjectReference {
        api_version: Some(Scheduler::api_version(&()).to_string()),
        kind: Some(Scheduler::kind(&()).to_string()),
        name: Some(CLUSTER_RESOURCE_NAME.to_string()),
        ..Default::default()
    }
}

fn truncate_note(message: &str) -> &str {
    if message.len() <= MAX_NOTE_BYTES {
        return message;
    }
    let mut end = MAX_NOTE_BYTES;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}
