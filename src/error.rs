/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice (including the next
 * paragraph) shall be included in all copies or substantial portions of the
 * Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
//! Error types used throughout `ditem`.
//!
//! Three error surfaces are distinguished:
//!
//! - [`StreamError`] wraps I/O failure and factory misuse at the codecs' entry points.
//! - [`SchemaBuildError`] is raised only while parsing a schema document.
//! - Wire-format and schema-operation failures are never `Result` errors: they are carried on the
//!   `DecodeStatus` of the returned item instead (see [`crate::status`]).
use std::result;

use thiserror::Error;

/// An alias for `Result<T, StreamError>`, used by the codec entry points and the factory.
pub type Result<T> = result::Result<T, StreamError>;

/// Failure of the byte/character stream underlying a codec, or of a factory invariant. The codec
/// never returns this for malformed *input* - that is carried on the decoded item's
/// `DecodeStatus` instead.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The underlying reader or writer failed.
    #[error("I/O error on underlying stream")]
    Io(#[from] std::io::Error),
    /// The factory was asked to build an item that violates a hard invariant, e.g. a `Simple`
    /// value in the reserved `20..=31` range, or Base64 text that does not decode.
    #[error("illegal data item construction: {0}")]
    IllegalConstruction(&'static str),
    /// An attempt was made to move a `DecodeStatus` out of a failure state once assigned.
    #[error("decode status is a failure value and cannot be un-set")]
    IllegalStatusTransition,
}

/// Raised when a schema *document* is malformed. This is a programmer-visible configuration
/// error, not a runtime data error - the latter is reported via `DecodeStatus::FailedSchema` and
/// the `WarningSink`, never via `Result`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid schema at `{path}`: {reason}")]
pub struct SchemaBuildError {
    /// Dotted path to the offending node in the schema document, e.g. `root.properties.foo`.
    pub path: String,
    /// Human-readable description of the problem.
    pub reason: String,
}

impl SchemaBuildError {
    /// Construct a new `SchemaBuildError` at `path` with `reason`.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaBuildError {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// An alias for `Result<T, SchemaBuildError>`, used by the schema builder.
pub type BuildResult<T> = result::Result<T, SchemaBuildError>;
