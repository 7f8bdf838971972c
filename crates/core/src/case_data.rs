// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Case data store (C2, §4.2): a semi-structured XML document per case plus
//! a document per live work item, and the input/output query application
//! that moves data between them.
//!
//! Case data is XML per the classic YAWL data model, so [`CaseDocument`]
//! wraps an [`sxd_document::Package`] directly rather than a generic
//! key/value map: flow predicates and data queries are XPath expressions
//! (C3, `yawl-xpath`) evaluated against this same document.

use std::collections::HashSet;

use sxd_document::dom::Element;
use sxd_document::Package;
use thiserror::Error;

use crate::spec::model::DataQuery;

#[derive(Debug, Error)]
pub enum CaseDataError {
    #[error("variable {0} not found in document")]
    MissingVariable(String),
}

/// A net-local or task-local data document. Net-local documents hold case
/// variables scoped to the whole case; task-local documents are built by
/// [`CaseDocument::extract_task_input`] for one work item's input, and
/// folded back by [`CaseDocument::merge_task_output`].
pub struct CaseDocument {
    package: Package,
    /// Keys of `(workitem_id, attempt)` whose output has already been
    /// merged, so a repeated merge for the same attempt is a no-op (§4.2:
    /// "idempotent with respect to re-application of the same output").
    applied_merges: HashSet<String>,
}

impl CaseDocument {
    /// A fresh document with an empty `<case>` root element.
    pub fn empty() -> Self {
        let package = Package::new();
        {
            let doc = package.as_document();
            let root = doc.create_element("case");
            doc.root().append_child(root);
        }
        Self { package, applied_merges: HashSet::new() }
    }

    #[allow(clippy::expect_used)]
    fn root(&self) -> Element<'_> {
        let doc = self.package.as_document();
        doc.root()
            .children()
            .into_iter()
            .find_map(|c| c.element())
            .expect("CaseDocument always has a root element")
    }

    fn find_variable(&self, name: &str) -> Option<Element<'_>> {
        self.root().children().into_iter().find_map(|c| {
            let el = c.element()?;
            (el.name().local_part() == name).then_some(el)
        })
    }

    fn element_text(el: Element<'_>) -> String {
        el.children()
            .into_iter()
            .filter_map(|c| c.text())
            .map(|t| t.text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// `getNetVariable(case, name)` (§4.2).
    pub fn get_variable(&self, name: &str) -> Option<String> {
        self.find_variable(name).map(Self::element_text)
    }

    /// `setNetVariable(case, name, value)` (§4.2). Replaces the variable's
    /// element if it already exists; otherwise appends a new one.
    pub fn set_variable(&mut self, name: &str, value: &str) {
        let doc = self.package.as_document();
        if let Some(existing) = self.find_variable(name) {
            for child in existing.children() {
                existing.remove_child(child);
            }
            let text = doc.create_text(value);
            existing.append_child(text);
            return;
        }
        let el = doc.create_element(name);
        let text = doc.create_text(value);
        el.append_child(text);
        self.root().append_child(el);
    }

    /// `extractTaskInput(case, task)`: build a task-local document from this
    /// case's variables by applying `task`'s input queries (§4.2). Each
    /// query's `select` is resolved as a plain variable-name lookup; full
    /// XPath selection against the case document is performed by the
    /// caller (`yawl-runtime`) via `yawl-xpath` before values reach here
    /// when a query selects more than a bare variable.
    pub fn extract_task_input(&self, queries: &[DataQuery]) -> CaseDocument {
        let mut task_doc = CaseDocument::empty();
        for q in queries {
            if let Some(value) = self.get_variable(&q.select) {
                task_doc.set_variable(&q.target, &value);
            }
        }
        task_doc
    }

    /// `mergeTaskOutput(case, task, taskDoc)`: fold a completed work item's
    /// output document back into this case document by applying `task`'s
    /// output queries (§4.2). Idempotent per `(workitem_id, attempt)`: a
    /// repeated merge for the same attempt is a no-op.
    pub fn merge_task_output(
        &mut self,
        queries: &[DataQuery],
        task_doc: &CaseDocument,
        merge_key: &str,
    ) -> bool {
        if !self.applied_merges.insert(merge_key.to_string()) {
            return false;
        }
        for q in queries {
            if let Some(value) = task_doc.get_variable(&q.select) {
                self.set_variable(&q.target, &value);
            }
        }
        true
    }

    /// All current variable names, for diagnostics and XPath context
    /// construction in `yawl-xpath`.
    pub fn variable_names(&self) -> Vec<String> {
        self.root()
            .children()
            .into_iter()
            .filter_map(|c| c.element())
            .map(|el| el.name().local_part().to_string())
            .collect()
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Fold every variable into a flat `{name: value}` JSON object, used to
    /// carry case data inside event payloads (§4.4) so a restarted engine
    /// can reconstruct a case's data document from the log alone without a
    /// separate snapshot store (§4.7 "Recover").
    pub fn to_snapshot(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for name in self.variable_names() {
            if let Some(value) = self.get_variable(&name) {
                map.insert(name, serde_json::Value::String(value));
            }
        }
        serde_json::Value::Object(map)
    }

    /// Inverse of [`CaseDocument::to_snapshot`].
    pub fn from_snapshot(value: &serde_json::Value) -> Self {
        let mut doc = Self::empty();
        if let Some(obj) = value.as_object() {
            for (name, value) in obj {
                if let Some(s) = value.as_str() {
                    doc.set_variable(name, s);
                }
            }
        }
        doc
    }
}

impl Clone for CaseDocument {
    fn clone(&self) -> Self {
        let mut cloned = CaseDocument::empty();
        for name in self.variable_names() {
            if let Some(value) = self.get_variable(&name) {
                cloned.set_variable(&name, &value);
            }
        }
        cloned.applied_merges = self.applied_merges.clone();
        cloned
    }
}

#[cfg(test)]
#[path = "case_data_tests.rs"]
mod tests;
