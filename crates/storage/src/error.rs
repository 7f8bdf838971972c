// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage-layer errors. A fatal `Wal` error maps straight onto
//! [`yawl_core::LogError`] at the call site (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("failed to open WAL at {path}: {source}")]
    Open { path: String, source: std::io::Error },
    #[error("failed to write WAL entry: {0}")]
    Write(std::io::Error),
    #[error("failed to flush WAL: {0}")]
    Flush(std::io::Error),
    #[error("failed to read WAL: {0}")]
    Read(std::io::Error),
    #[error("failed to serialize event record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<WalError> for yawl_core::LogError {
    fn from(err: WalError) -> Self {
        yawl_core::LogError::AppendFailed(err.to_string())
    }
}
