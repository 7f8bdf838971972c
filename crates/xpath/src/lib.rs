// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow predicate evaluator (C3, §4.3).
//!
//! Evaluates an XPath expression over a case document ([`yawl_core::CaseDocument`])
//! and returns a boolean or numeric result. No crate in the retrieval pack
//! implements XPath; `sxd-xpath` is the standard XPath 1.0 evaluator in the
//! Rust ecosystem and is pulled in as an explicit enrichment (see
//! `DESIGN.md`). Deterministic: same document + same expression always
//! yields the same result (§4.3).

use sxd_xpath::{Context, Factory, Value};
use thiserror::Error;
use yawl_core::CaseDocument;

#[derive(Debug, Error)]
pub enum XPathError {
    #[error("invalid XPath expression `{expr}`: {reason}")]
    InvalidExpression { expr: String, reason: String },
    #[error("expression `{expr}` references unknown variable `{variable}`")]
    UnknownVariable { expr: String, variable: String },
    #[error("XPath evaluation failed for `{expr}`: {reason}")]
    EvaluationFailed { expr: String, reason: String },
}

/// XPath built-in function names and keywords that are never mistaken for a
/// bare case-data variable reference when scanning an expression for
/// missing-variable diagnostics.
const XPATH_KEYWORDS: &[&str] = &[
    "count", "not", "true", "false", "string", "number", "boolean", "sum", "concat",
    "contains", "starts-with", "substring", "name", "local-name", "position", "last",
    "floor", "ceiling", "round", "and", "or", "div", "mod", "text",
];

/// Evaluate `expr` against `doc` and coerce the result to a boolean per
/// XPath 1.0 coercion rules (used for split/join predicates, §4.5.1, §4.5.3).
pub fn evaluate_bool(doc: &CaseDocument, expr: &str) -> Result<bool, XPathError> {
    let value = evaluate(doc, expr)?;
    Ok(coerce_bool(&value))
}

/// Evaluate `expr` against `doc` and coerce the result to a number (used
/// for multi-instance creation-count expressions, §4.5.2).
pub fn evaluate_number(doc: &CaseDocument, expr: &str) -> Result<f64, XPathError> {
    let value = evaluate(doc, expr)?;
    Ok(coerce_number(&value))
}

#[allow(clippy::expect_used)]
fn evaluate(doc: &CaseDocument, expr: &str) -> Result<Value<'_>, XPathError> {
    check_known_variables(doc, expr)?;

    let factory = Factory::new();
    let xpath = factory
        .build(expr)
        .map_err(|e| XPathError::InvalidExpression { expr: expr.to_string(), reason: e.to_string() })?
        .ok_or_else(|| XPathError::InvalidExpression {
            expr: expr.to_string(),
            reason: "empty expression".into(),
        })?;

    let sxd_doc = doc.package().as_document();
    let context = Context::new();
    let case_element = sxd_doc
        .root()
        .children()
        .into_iter()
        .find_map(|c| c.element())
        .expect("CaseDocument always has a `<case>` root element");

    xpath
        .evaluate(&context, case_element)
        .map_err(|e| XPathError::EvaluationFailed { expr: expr.to_string(), reason: e.to_string() })
}

/// Best-effort missing-variable diagnosis (§4.3): scans `expr` for
/// identifier-like tokens, ignores XPath keywords/function names and
/// anything that looks like a path step (contains `/`), and fails fast if a
/// remaining bare token matches neither a known case-data variable nor a
/// valid numeric literal.
fn check_known_variables(doc: &CaseDocument, expr: &str) -> Result<(), XPathError> {
    if expr.contains('/') {
        // Path expressions (e.g. `count(/items/*)`) address document
        // structure directly rather than a named case variable; leave
        // missing-node diagnosis to the evaluator itself (an absent path
        // simply yields an empty node-set per XPath semantics).
        return Ok(());
    }

    let known = doc.variable_names();
    for token in tokenize_identifiers(expr) {
        if XPATH_KEYWORDS.contains(&token.as_str()) {
            continue;
        }
        if token.parse::<f64>().is_ok() {
            continue;
        }
        if !known.iter().any(|v| v == &token) {
            return Err(XPathError::UnknownVariable { expr: expr.to_string(), variable: token });
        }
    }
    Ok(())
}

fn tokenize_identifiers(expr: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in expr.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn coerce_bool(value: &Value<'_>) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::Nodeset(nodes) => nodes.size() > 0,
    }
}

fn coerce_number(value: &Value<'_>) -> f64 {
    match value {
        Value::Number(n) => *n,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Nodeset(nodes) => nodes
            .iter()
            .next()
            .map(|n| n.string_value())
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(f64::NAN),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
