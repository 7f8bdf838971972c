// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk representation of a specification and the loader trait that
//! turns bytes into a validated [`SpecificationModel`].
//!
//! The real YAWL deployment target for this engine replaces
//! [`JsonSpecLoader`] with a loader that consumes actual YAWL XML and the
//! full YAWL schema; that parser is out of scope here (§1). This module's
//! thin on-disk format mirrors [`SpecificationModel`] field-for-field so the
//! rest of the workspace has something concrete to load, validate, and run
//! against.

use thiserror::Error;

use super::model::SpecificationModel;
use super::validate::{Diagnostic, Severity};

#[derive(Debug, Error)]
pub enum SpecDocumentError {
    #[error("malformed specification document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("specification failed validation: {0:?}")]
    Invalid(Vec<Diagnostic>),
}

/// Loads a [`SpecificationModel`] from a byte stream. Implementations own
/// the wire/file format; the model they hand back is what the rest of the
/// engine operates on.
pub trait SpecLoader: Send + Sync {
    fn load(&self, bytes: &[u8]) -> Result<SpecificationModel, SpecDocumentError>;
}

/// Reads the thin JSON on-disk representation described above: a direct
/// `serde_json` deserialization of [`SpecificationModel`], followed by
/// OR-join trigger-place precomputation and full structural validation.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSpecLoader;

impl SpecLoader for JsonSpecLoader {
    fn load(&self, bytes: &[u8]) -> Result<SpecificationModel, SpecDocumentError> {
        let mut model: SpecificationModel = serde_json::from_slice(bytes)?;
        model.compute_or_join_triggers();

        let diags = model.validate();
        if diags.iter().any(|d| d.severity == Severity::Fatal) {
            return Err(SpecDocumentError::Invalid(diags));
        }

        Ok(model)
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
