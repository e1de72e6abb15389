// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery and cached resource access.

pub mod crd;
pub mod listers;

pub use crd::wait_for_scheduler_crd;
pub use listers::SchedulerLister;
