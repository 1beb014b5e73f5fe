// SPDX-FileCopyrightText: 2025 svarm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Encoding errors.
//!
//! Every variant is a recoverable, emit-time condition: the encoder reports
//! it without writing anything to the buffer, and the MacroAssembler is free
//! to catch it and try the next candidate encoding.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// A register operand is outside the class the encoding can name.
    #[error("register out of class: {0}")]
    RegisterClass(&'static str),
    /// An immediate has no representation in the target field.
    #[error("immediate {value} not encodable: {field}")]
    ImmediateRange { value: i64, field: &'static str },
    /// The lane size is not supported by this encoding.
    #[error("unsupported lane size: {0}")]
    LaneSize(&'static str),
    /// A condition or qualifier is illegal in the current context.
    #[error("condition illegal here: {0}")]
    ConditionContext(&'static str),
    /// The MacroAssembler ran out of caller-invisible scratch registers.
    #[error("scratch register pool exhausted")]
    ScratchExhausted,
}
