//! Canonical JSON emission (RFC 8785 / JCS).
//!
//! State records and `--json` CLI output are emitted canonically so that identical values
//! produce byte-identical documents. Object keys are sorted by JCS; anything whose order
//! matters must therefore be encoded as an array, which is why ordered maps persist as
//! `[key, value]` pair lists.

use anyhow::{Context, Result};
use serde::Serialize;

/// Serialize `value` to canonical JSON.
pub fn emit_jcs<T: Serialize>(value: &T) -> Result<String> {
    let json_value =
        serde_json::to_value(value).context("Failed to serialize value to JSON")?;
    let json_bytes = serde_json_canonicalizer::to_vec(&json_value)
        .context("Failed to canonicalize JSON using JCS")?;
    String::from_utf8(json_bytes).context("JCS output contained invalid UTF-8")
}
