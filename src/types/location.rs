// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::fmt;

/// Identifies a named resource in a namespace.
///
/// The zero value is a tombstone: used as a sync source it means the
/// destination must not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLocation {
    pub name: String,
    pub namespace: String,
}

impl ResourceLocation {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.name.is_empty() && self.namespace.is_empty()
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tombstone() {
            write!(f, "<none>")
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}
