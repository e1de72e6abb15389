// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster resource and location types shared by observers and the syncer.

pub mod location;
pub mod scheduler;

pub use location::ResourceLocation;
pub use scheduler::{ConfigMapNameReference, Scheduler, SchedulerSpec};
