// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP error body shape shared by Interfaces A, B, and X (§6, §7):
//! `{"kind": "...", "message": "..."}`. `kind` mirrors the variant name of
//! whichever [`yawl_core::EngineError`] arm produced it; mapping an
//! `EngineError` to an HTTP status code is `yawl-daemon`'s job, not this
//! crate's, since that mapping is transport policy, not wire shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: kind.into(), message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let resp = ErrorResponse::new("not_found", "case 1 not found");
        let json = serde_json::to_string(&resp).unwrap();
        let back: ErrorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(resp, back);
    }
}
