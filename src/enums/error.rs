// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # Error Module - Custom *binop* Error Types
//!
//! Defines the terminal statuses a binary-op invocation can report, plus the
//! registration error raised while the task registry is being built.
//!
//! ## Features
//! - Covers unknown operation codes, operand and scalar type mismatches,
//! integer arithmetic faults, backend launch failures, shape and view errors.
//! - Implements `Display` for readable output and `Error` for integration
//! with standard Rust error handling.
//! - Nothing here is retried by the crate. Retry is the scheduler's call.

use std::error::Error;
use std::fmt;

use crate::{Backend, TaskId};

/// Integer fault raised by a per-element functor.
///
/// Carried through the hot loop as a plain `Copy` value and turned into
/// [`BinaryOpError::ArithmeticFault`] once the loop has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Integer division, floor division or remainder by zero.
    DivideByZero,
    /// Integer power with a negative exponent.
    NegativeExponent,
}

impl Fault {
    /// Compact code shared with device kernels. `0` means no fault.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            Fault::DivideByZero => 1,
            Fault::NegativeExponent => 2,
        }
    }

    #[inline]
    pub const fn from_code(code: u8) -> Option<Fault> {
        match code {
            1 => Some(Fault::DivideByZero),
            2 => Some(Fault::NegativeExponent),
            _ => None,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::DivideByZero => f.write_str("integer division by zero"),
            Fault::NegativeExponent => f.write_str("integer power with negative exponent"),
        }
    }
}

/// Catch all error type for a binary-op invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum BinaryOpError {
    /// The operation code is not in the registry. Unsigned codes past
    /// `i64::MAX` are reported as `i64::MAX`.
    UnsupportedOperation { code: i64 },
    /// Operand, output or scalar-argument types have no valid specialization.
    TypeMismatch { op: &'static str, message: String },
    /// An integer functor faulted at the given linear output index.
    ArithmeticFault {
        op: &'static str,
        fault: Fault,
        index: usize,
    },
    /// Thread pool or device failure unrelated to the data.
    BackendExecutionFailure { backend: Backend, message: String },
    /// Inputs cannot be broadcast to the output shape.
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
        message: Option<String>,
    },
    /// A view or context is malformed.
    InvalidView { message: String },
}

impl BinaryOpError {
    pub(crate) fn type_mismatch(op: &'static str, message: impl Into<String>) -> Self {
        BinaryOpError::TypeMismatch {
            op,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_view(message: impl Into<String>) -> Self {
        BinaryOpError::InvalidView {
            message: message.into(),
        }
    }

    pub(crate) fn backend(backend: Backend, message: impl Into<String>) -> Self {
        BinaryOpError::BackendExecutionFailure {
            backend,
            message: message.into(),
        }
    }
}

impl fmt::Display for BinaryOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOpError::UnsupportedOperation { code } => {
                write!(f, "Unsupported operation: code {} is not a registered binary op.", code)
            }
            BinaryOpError::TypeMismatch { op, message } => {
                write!(f, "Type mismatch in '{}': {}", op, message)
            }
            BinaryOpError::ArithmeticFault { op, fault, index } => {
                write!(f, "Arithmetic fault in '{}' at element {}: {}.", op, index, fault)
            }
            BinaryOpError::BackendExecutionFailure { backend, message } => {
                write!(f, "Backend execution failure on {}: {}", backend, message)
            }
            BinaryOpError::ShapeMismatch {
                expected,
                found,
                message,
            } => {
                if let Some(msg) = message {
                    write!(
                        f,
                        "Shape mismatch: cannot broadcast {:?} to {:?}: {}",
                        found, expected, msg
                    )
                } else {
                    write!(f, "Shape mismatch: cannot broadcast {:?} to {:?}.", found, expected)
                }
            }
            BinaryOpError::InvalidView { message } => {
                write!(f, "Invalid view: {}", message)
            }
        }
    }
}

impl Error for BinaryOpError {}

/// Raised while populating the task registry during initialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateTask { task_id: TaskId, name: &'static str },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateTask { task_id, name } => {
                write!(f, "Task id {} is already registered (by '{}').", task_id, name)
            }
        }
    }
}

impl Error for RegistryError {}
