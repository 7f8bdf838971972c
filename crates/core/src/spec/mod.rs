// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory specification model (C1): nets, tasks, conditions, flows,
//! decompositions, and the data bindings between them.
//!
//! The XML/YAWL grammar that produces a [`SpecificationModel`] is out of
//! scope for this workspace (see [`document`]); this module only owns the
//! validated in-memory shape and the read-only accessors the net runner
//! drives off of.

pub mod document;
pub mod model;
pub mod or_join;
pub mod validate;

pub use model::{
    Condition, CreationMode, Decomposition, Flow, JoinType, MiBounds, Net, Place,
    SpecificationModel, SplitType, Task,
};
pub use validate::{Diagnostic, Severity};

use smol_str::SmolStr;

/// Identifier of a net within a specification (the root net or a sub-net).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct NetId(pub SmolStr);

/// Identifier of a task within a net.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct TaskId(pub SmolStr);

/// Identifier of a condition (explicit place) within a net.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ConditionId(pub SmolStr);

/// Identifier of a decomposition: either an atomic task binding or a sub-net.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct DecompositionId(pub SmolStr);

macro_rules! smolstr_id {
    ($name:ident) => {
        impl $name {
            pub fn new(s: impl Into<SmolStr>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(SmolStr::new(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(SmolStr::new(s))
            }
        }
    };
}

smolstr_id!(NetId);
smolstr_id!(TaskId);
smolstr_id!(ConditionId);
smolstr_id!(DecompositionId);

/// Identifier of a specification: (identifier, version, uri). Equality
/// requires all three fields to match, per §3 of the data model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SpecId {
    pub identifier: String,
    pub version: String,
    pub uri: String,
}

impl SpecId {
    pub fn new(identifier: impl Into<String>, version: impl Into<String>, uri: impl Into<String>) -> Self {
        Self { identifier: identifier.into(), version: version.into(), uri: uri.into() }
    }

    /// Legacy fallback match for pre-versioned specs: matches on identifier
    /// alone when the candidate carries no version/uri (both empty).
    pub fn matches_legacy(&self, other: &LegacySpecRef) -> bool {
        self.identifier == other.identifier
    }
}

impl std::fmt::Display for SpecId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.identifier, self.version)
    }
}

/// A pre-versioned reference to a specification, carrying only an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySpecRef {
    pub identifier: String,
}
