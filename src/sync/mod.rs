// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cross-namespace mirroring of config maps and secrets.

pub mod apply;
pub mod controller;
pub mod syncer;

pub use controller::ResourceSyncController;
pub use syncer::{ResourceSyncHandle, ResourceSyncer, SyncKey, SyncKind, SyncSource};
