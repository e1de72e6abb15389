// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Cluster resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid config path {path}: {reason}")]
    InvalidConfigPath { path: String, reason: String },

    #[error("Sync not allowed: {0}")]
    SyncNotAllowed(String),

    #[error("Sync source not found: {0}")]
    SourceNotFound(String),

    #[error("Sync conflict: {0}")]
    SyncConflict(String),

    #[error("Resource sync controller unavailable: {0}")]
    SyncUnavailable(String),

    #[error("Event recording failed: {0}")]
    EventError(String),
}

impl OperatorError {
    /// Whether retrying the same operation later can succeed without outside intervention.
    pub fn is_transient(&self) -> bool {
        match self {
            OperatorError::KubeError(kube::Error::Api(resp)) => {
                resp.code == 409 || resp.code == 429 || resp.code >= 500
            }
            OperatorError::KubeError(_) => true,
            OperatorError::SourceNotFound(_) | OperatorError::SyncConflict(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, OperatorError>;
