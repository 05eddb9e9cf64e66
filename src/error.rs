// P2P Testdata - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for dataset generation.

use thiserror::Error;

/// Main error type for generator operations.
#[derive(Error, Debug)]
pub enum TestdataError {
    /// IO error while reading reference files or writing artifacts
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown label name in a quota specification
    #[error("Unknown label in quotas: {0}")]
    UnknownLabel(String),

    /// Malformed quota entry (expected LABEL=count)
    #[error("Invalid quota entry: {0}")]
    InvalidQuota(String),
}

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, TestdataError>;
